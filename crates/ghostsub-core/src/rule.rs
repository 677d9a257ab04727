// crates/ghostsub-core/src/rule.rs

use crate::token::SequenceToken;

/// In the compressed payload, `missing` stands for `substituted`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstitutionRule {
    pub missing: SequenceToken,
    pub substituted: SequenceToken,
}

impl SubstitutionRule {
    pub fn new(missing: SequenceToken, substituted: SequenceToken) -> Self {
        Self { missing, substituted }
    }

    /// Bytes this rule occupies in an artifact: two length bytes plus both tokens.
    pub fn encoded_len(&self) -> usize {
        2 + self.missing.len() + self.substituted.len()
    }
}

/// Append-only rule list; position is application order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DictionaryLog {
    rules: Vec<SubstitutionRule>,
}

impl DictionaryLog {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn push(&mut self, rule: SubstitutionRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[SubstitutionRule] {
        &self.rules
    }

    /// Rules in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, SubstitutionRule> {
        self.rules.iter()
    }

    /// Rules in replay order for decompression.
    pub fn iter_reverse(&self) -> std::iter::Rev<std::slice::Iter<'_, SubstitutionRule>> {
        self.rules.iter().rev()
    }

    pub fn encoded_len(&self) -> usize {
        self.rules.iter().map(SubstitutionRule::encoded_len).sum()
    }
}

impl From<Vec<SubstitutionRule>> for DictionaryLog {
    fn from(rules: Vec<SubstitutionRule>) -> Self {
        Self { rules }
    }
}

impl<'a> IntoIterator for &'a DictionaryLog {
    type Item = &'a SubstitutionRule;
    type IntoIter = std::slice::Iter<'a, SubstitutionRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
