pub mod executor;
pub mod linkup;
pub mod registry;
pub mod schema;
pub mod search;

pub use executor::{ToolExecutor, ToolOutcome};
pub use linkup::LinkupClient;
pub use registry::{Tool, ToolRegistry};
pub use schema::{ParamSpec, ParamType, ToolArgs, ToolSchema};
pub use search::{
    OutputType, SearchDepth, SearchError, SearchHits, SearchItem, SearchOptions, SearchProvider,
    SearchResult, SearchTool,
};
