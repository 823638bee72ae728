use mongodb::IndexModel;

pub trait MongoIndexModelProvider {
    fn index_models() -> Vec<IndexModel>;

    /// 唯一约束字段组，内存存储据此做冲突检查
    fn unique_keys() -> Vec<Vec<&'static str>> {
        vec![]
    }
}
