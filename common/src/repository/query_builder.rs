use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl PageInfo {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page: page.max(1), page_size: page_size.max(1) }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }
}

/// 列表查询 DTO 实现，通常由 `#[derive(QueryFilter)]` 生成
pub trait QueryFilterProvider {
    fn to_query_builder(&self) -> QueryBuilder;

    fn page_info(&self) -> PageInfo {
        PageInfo::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Eq(String, Bson),
    In(String, Vec<Bson>),
    Like(String, String),
    AnyLike(Vec<String>, String),
}

/// 过滤条件，所有子句之间为 AND。
///
/// 同一份条件既可以渲染为 MongoDB 查询文档，也可以直接在内存文档上求值。
/// 字符串匹配区分大小写；数组字段上的 eq 表示“包含”。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    clauses: Vec<Clause>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.clauses.push(Clause::Eq(field.to_string(), value.into()));
        self
    }

    pub fn in_array<T: Into<Bson>>(mut self, field: &str, values: Vec<T>) -> Self {
        let arr = values.into_iter().map(Into::into).collect::<Vec<_>>();
        self.clauses.push(Clause::In(field.to_string(), arr));
        self
    }

    /// 子串匹配；空字符串不产生条件
    pub fn like(mut self, field: &str, needle: &str) -> Self {
        if !needle.is_empty() {
            self.clauses.push(Clause::Like(field.to_string(), needle.to_string()));
        }
        self
    }

    /// 任一字段包含子串
    pub fn any_like(mut self, fields: &[&str], needle: &str) -> Self {
        if !needle.is_empty() && !fields.is_empty() {
            self.clauses.push(Clause::AnyLike(fields.iter().map(|f| f.to_string()).collect(), needle.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn build(&self) -> Document {
        let mut docs = self.clauses.iter().map(Clause::to_document).collect::<Vec<_>>();
        match docs.len() {
            0 => doc! {},
            1 => docs.remove(0),
            _ => doc! { "$and": docs },
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|clause| clause.matches(document))
    }
}

impl Clause {
    fn to_document(&self) -> Document {
        match self {
            Clause::Eq(field, value) => doc! { field.as_str(): value.clone() },
            Clause::In(field, values) => doc! { field.as_str(): { "$in": values.clone() } },
            Clause::Like(field, needle) => like_doc(field, needle),
            Clause::AnyLike(fields, needle) => {
                let any = fields.iter().map(|f| like_doc(f, needle)).collect::<Vec<_>>();
                doc! { "$or": any }
            }
        }
    }

    fn matches(&self, document: &Document) -> bool {
        match self {
            Clause::Eq(field, value) => field_matches(document, field, |v| bson_cmp(v, value) == Ordering::Equal),
            Clause::In(field, values) => {
                field_matches(document, field, |v| values.iter().any(|value| bson_cmp(v, value) == Ordering::Equal))
            }
            Clause::Like(field, needle) => field_matches(document, field, |v| contains_str(v, needle)),
            Clause::AnyLike(fields, needle) => {
                fields.iter().any(|field| field_matches(document, field, |v| contains_str(v, needle)))
            }
        }
    }
}

fn like_doc(field: &str, needle: &str) -> Document {
    doc! { field: { "$regex": regex::escape(needle) } }
}

fn contains_str(value: &Bson, needle: &str) -> bool {
    matches!(value, Bson::String(s) if s.contains(needle))
}

/// 数组字段：任一元素满足即匹配
fn field_matches(document: &Document, field: &str, pred: impl Fn(&Bson) -> bool) -> bool {
    match document.get(field) {
        None => false,
        Some(Bson::Array(items)) => items.iter().any(&pred),
        Some(value) => pred(value),
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// 文档字段值比较：数值跨类型比较，缺失/Null 最小
pub fn bson_cmp(a: &Bson, b: &Bson) -> Ordering {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::Null, Bson::Null) => Ordering::Equal,
        (Bson::Null, _) => Ordering::Less,
        (_, Bson::Null) => Ordering::Greater,
        _ if a == b => Ordering::Equal,
        _ => a.to_string().cmp(&b.to_string()),
    }
}
