//! 数据集结构
//!
//! 只保留目录接口返回内容中的列名列表。

use serde_json::Value;

/// 远端数据集的列名快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSchema {
    columns: Vec<String>,
}

impl DatasetSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// 从目录接口响应中提取列名
    ///
    /// 支持 `{"dataset": {"fields": [...]}}`（v2 目录）与顶层 `{"fields": [...]}`
    /// 两种形态；其他形态视为未发现任何列，由字段解析使用默认列名。
    pub fn from_catalog(payload: &Value) -> Self {
        let fields = payload
            .get("dataset")
            .and_then(|d| d.get("fields"))
            .or_else(|| payload.get("fields"))
            .and_then(Value::as_array);

        let columns = fields
            .map(|items| {
                items
                    .iter()
                    .filter_map(|f| f.get("name").and_then(Value::as_str))
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
