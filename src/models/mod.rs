//! 核心数据模型模块
//!
//! 定义数据集端点、字段结构、过滤条件、静态对照表与记录归一化。

pub mod catalog;
pub mod endpoint;
pub mod fields;
pub mod filter;
pub mod record;
pub mod schema;

pub use endpoint::DatasetEndpoint;
pub use fields::{FieldSlot, ResolvedFields};
pub use filter::{Dialect, SearchFilter, SortMode};
pub use record::{NormalizedRecord, normalize};
pub use schema::DatasetSchema;
