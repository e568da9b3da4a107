//! Allow-list of aircraft selected for the replay

use anyhow::Context;
use std::collections::HashSet;


/// Set of transponder codes to replay, empty means no filtering
pub struct AcFilter {
    ids: HashSet<u32>,
}

impl AcFilter {
    /// Builds the allow-list as the union of the hex and decimal command
    /// line lists, duplicates are tolerated
    pub fn new(hex_list: Option<&str>, decimal_list: Option<&str>) -> anyhow::Result<Self> {
        let mut ids = HashSet::new();

        if let Some(list) = hex_list {
            for item in list.split(',') {
                let id = u32::from_str_radix(item.trim(), 16)
                    .with_context(|| format!("Invalid hex aircraft id '{}'", item.trim()))?;
                ids.insert(id);
            }
        }

        if let Some(list) = decimal_list {
            for item in list.split(',') {
                let id = item.trim().parse::<u32>()
                    .with_context(|| format!("Invalid decimal aircraft id '{}'", item.trim()))?;
                ids.insert(id);
            }
        }

        Ok(AcFilter { ids })
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// An empty filter selects every aircraft
    pub fn selects(&self, id: u32) -> bool {
        self.ids.is_empty() || self.ids.contains(&id)
    }

    /// Selected ids in ascending order, for diagnostics
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_filter_selects_everything() {
        let filter = AcFilter::new(None, None).unwrap();
        assert!(filter.is_empty());
        assert!(filter.selects(0));
        assert!(filter.selects(11_259_375));
    }

    #[test]
    fn hex_and_decimal_lists_are_unioned() {
        // 0xABCDEF = 11259375, also given in decimal: duplicates are fine
        let filter = AcFilter::new(Some("abcdef,3039"), Some("11259375,4660")).unwrap();
        assert_eq!(vec![0x1234, 0x3039, 11_259_375], filter.ids());
        assert!(filter.selects(0xABCDEF));
        assert!(filter.selects(0x3039));
        assert!(filter.selects(4660));
        assert!(!filter.selects(42));
    }

    #[rstest]
    #[case(Some("xyz"), None)]
    #[case(None, Some("abcdef"))]
    #[case(Some("abc,"), None)]
    fn invalid_id_is_an_error(#[case] hex: Option<&str>, #[case] decimal: Option<&str>) {
        assert!(AcFilter::new(hex, decimal).is_err());
    }
}
