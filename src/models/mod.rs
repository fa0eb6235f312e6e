pub mod api_docs;
pub mod postman;
pub mod raw_dump;

pub use api_docs::{ApiCollection, ApiItem, BodyMode, Parameter, ParsedCollection, Request, Response};
pub use postman::{ItemNode, PostmanCollection, PostmanItem, PostmanRequest};
pub use raw_dump::{CodeSnippet, RawDump, path_to_identifier};
