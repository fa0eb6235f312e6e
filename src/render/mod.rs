pub mod simple_render;

pub use simple_render::{ApiDetailRender, ApiTagOutput, SimpleApiRender};
