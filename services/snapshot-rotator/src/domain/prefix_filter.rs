/// 名前の前方一致フィルター
///
/// スナップショット一覧・インデックス一覧から、
/// 指定したプレフィックスで始まる名前だけを選び出す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixFilter {
    prefix: String,
}

impl PrefixFilter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// 名前がプレフィックスで始まるか
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }

    /// 一致する名前のみを入力順のまま返す
    pub fn select<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter(|name| self.matches(name))
            .map(str::to_string)
            .collect()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
