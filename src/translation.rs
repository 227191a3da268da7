use crate::error::{Error, Result};
use crate::pager::PagingConfig;

/// Represents the decomposed components of a referenced address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageAddress {
    pub address: u64,
    pub page: u64,
    pub offset: u64,
    /// `page` as a table index, saturated at `usize::MAX` when it does not fit
    index: usize,
}

impl PageAddress {
    /// Decompose a raw address for a power-of-two page size
    pub fn from_raw(address: u64, page_size: u64) -> Self {
        debug_assert!(page_size.is_power_of_two());
        let shift = page_size.trailing_zeros();
        let mask = page_size - 1;
        let page = address >> shift;

        PageAddress {
            address,
            page,
            offset: address & mask,
            index: usize::try_from(page).unwrap_or(usize::MAX),
        }
    }

    /// Decompose and bounds-check an address against a paging configuration
    pub fn translate(address: u64, config: &PagingConfig) -> Result<Self> {
        let pa = Self::from_raw(address, config.page_size());
        if pa.index >= config.pages() {
            return Err(Error::AddressOutOfRange {
                address,
                page: pa.page,
                pages: config.pages(),
            });
        }
        Ok(pa)
    }

    /// Page as a table index. Below the page count once `translate` succeeded.
    #[inline]
    pub fn page_index(&self) -> usize {
        self.index
    }
}

impl std::fmt::Display for PageAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "addr({}) = (page={}, offset={})", self.address, self.page, self.offset)
    }
}

/// Translate a whole trace up front so that no simulation state is touched
/// when one of the addresses is out of range.
pub fn translate_trace(addresses: &[u64], config: &PagingConfig) -> Result<Vec<PageAddress>> {
    addresses
        .iter()
        .map(|&address| PageAddress::translate(address, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replacement::EvictionPolicy;

    #[test]
    fn test_decomposition_512() {
        // 1300 = 2 * 512 + 276
        let pa = PageAddress::from_raw(1300, 512);
        assert_eq!(pa.page, 2);
        assert_eq!(pa.offset, 276);
        assert_eq!(pa.address, 1300);
    }

    #[test]
    fn test_decomposition_page_size_one() {
        // page size 1 makes every address its own page
        let pa = PageAddress::from_raw(17, 1);
        assert_eq!(pa.page, 17);
        assert_eq!(pa.offset, 0);
    }

    #[test]
    fn test_decomposition_edge_cases() {
        let pa = PageAddress::from_raw(0, 4096);
        assert_eq!((pa.page, pa.offset), (0, 0));

        let pa = PageAddress::from_raw(4095, 4096);
        assert_eq!((pa.page, pa.offset), (0, 4095));

        let pa = PageAddress::from_raw(4096, 4096);
        assert_eq!((pa.page, pa.offset), (1, 0));
    }

    #[test]
    fn test_reconstruction() {
        for &original in &[0u64, 1, 511, 512, 1300, 4095, 70_000] {
            let pa = PageAddress::from_raw(original, 512);
            assert_eq!(pa.page * 512 + pa.offset, original, "Failed for address={}", original);
        }
    }

    #[test]
    fn test_translate_bounds() {
        let config = PagingConfig::new(3, 8, 512, EvictionPolicy::Fifo).unwrap();

        // last byte of the last page
        let pa = PageAddress::translate(8 * 512 - 1, &config).unwrap();
        assert_eq!(pa.page, 7);

        // first byte past the last page
        assert_eq!(
            PageAddress::translate(8 * 512, &config),
            Err(Error::AddressOutOfRange { address: 4096, page: 8, pages: 8 })
        );
    }

    #[test]
    fn test_page_index_matches_page() {
        let pa = PageAddress::from_raw(1300, 512);
        assert_eq!(pa.page_index(), 2);

        // the largest page number still maps to an index that fails the bounds check
        let pa = PageAddress::from_raw(u64::MAX, 1);
        assert_eq!(pa.page, u64::MAX);
        let config = PagingConfig::new(1, usize::MAX, 1, EvictionPolicy::Fifo).unwrap();
        assert_eq!(
            PageAddress::translate(u64::MAX, &config),
            Err(Error::AddressOutOfRange { address: u64::MAX, page: u64::MAX, pages: usize::MAX })
        );
    }

    #[test]
    fn test_translate_trace_reports_first_failure() {
        let config = PagingConfig::new(2, 2, 16, EvictionPolicy::Lru).unwrap();
        let err = translate_trace(&[0, 17, 40, 99], &config).unwrap_err();
        assert_eq!(err, Error::AddressOutOfRange { address: 40, page: 2, pages: 2 });

        let ok = translate_trace(&[0, 17, 31], &config).unwrap();
        let pages: Vec<u64> = ok.iter().map(|pa| pa.page).collect();
        assert_eq!(pages, vec![0, 1, 1]);
    }

    #[test]
    fn test_display() {
        let display = format!("{}", PageAddress::from_raw(1300, 512));
        assert!(display.contains("1300"));
        assert!(display.contains("page=2"));
        assert!(display.contains("offset=276"));
    }
}
