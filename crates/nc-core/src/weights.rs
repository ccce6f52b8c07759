//! Weight-branch bookkeeping.

/// One multiplicative weight column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightBranch {
    /// Column name.
    pub name: String,
    /// Whether the column carries a ratio to the central weight rather than
    /// an absolute weight.
    pub relative: bool,
}

/// Ordered collection of weight branches.
///
/// Central-scale branches carry the absolute weight; non-central branches
/// carry the ratio to central, so downstream statistical code can substitute
/// one relative branch at a time.
#[derive(Debug, Clone, Default)]
pub struct WeightBranchList {
    branches: Vec<WeightBranch>,
}

impl WeightBranchList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an absolute (central-scale) branch.
    pub fn push_central(&mut self, name: impl Into<String>) {
        self.branches.push(WeightBranch { name: name.into(), relative: false });
    }

    /// Append a relative (Up/Down) branch.
    pub fn push_relative(&mut self, name: impl Into<String>) {
        self.branches.push(WeightBranch { name: name.into(), relative: true });
    }

    /// Branch names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.branches.iter().map(|b| b.name.as_str()).collect()
    }

    /// Iterate over branches in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &WeightBranch> {
        self.branches.iter()
    }

    /// Number of branches.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order_and_flags() {
        let mut list = WeightBranchList::new();
        list.push_central("weight_bTagSF_Medium_Central");
        list.push_relative("weight_bTagSF_Medium_btagSFbc_correlatedUp_rel");
        assert_eq!(
            list.names(),
            vec![
                "weight_bTagSF_Medium_Central",
                "weight_bTagSF_Medium_btagSFbc_correlatedUp_rel"
            ]
        );
        let flags: Vec<bool> = list.iter().map(|b| b.relative).collect();
        assert_eq!(flags, vec![false, true]);
    }
}
