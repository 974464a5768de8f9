use crate::block::DimCode;
use crate::error::{MetaError, Result};

/// A named built-in test dataset shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoDataset {
    pub name: &'static str,
    pub extents: [i64; 4],
    pub ndim: DimCode,
}

const fn entry(name: &'static str, extents: [i64; 4], ndim: DimCode) -> DemoDataset {
    DemoDataset { name, extents, ndim }
}

static DEMO_DATASETS: &[DemoDataset] = &[
    entry("hacc", [280_953_867, 1, 1, 1], DimCode::D1),
    entry("hacc1b", [1_073_726_487, 1, 1, 1], DimCode::D1),
    entry("cesm", [3600, 1800, 1, 1], DimCode::D2),
    entry("exafel", [388, 59_200, 1, 1], DimCode::D2),
    entry("hurricane", [500, 500, 100, 1], DimCode::D3),
    entry("nyx-s", [512, 512, 512, 1], DimCode::D3),
    entry("nyx-m", [1024, 1024, 1024, 1], DimCode::D3),
    entry("qmc", [288, 69, 7935, 1], DimCode::D3),
    entry("qmcpre", [69, 69, 33_120, 1], DimCode::D3),
    entry("rtm", [235, 849, 849, 1], DimCode::D3),
    entry("parihaka", [1168, 1126, 922, 1], DimCode::D3),
];

pub fn all() -> &'static [DemoDataset] {
    DEMO_DATASETS
}

pub fn lookup(name: &str) -> Result<&'static DemoDataset> {
    DEMO_DATASETS
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| MetaError::UnknownDatasetName(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        let nyx = lookup("nyx-s").unwrap();
        assert_eq!(nyx.extents, [512, 512, 512, 1]);
        assert_eq!(nyx.ndim, DimCode::D3);
        assert_eq!(lookup("cesm").unwrap().ndim, DimCode::D2);
    }

    #[test]
    fn miss_is_an_error() {
        assert_eq!(
            lookup("nope"),
            Err(MetaError::UnknownDatasetName("nope".into()))
        );
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = all().iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all().len());
    }
}
