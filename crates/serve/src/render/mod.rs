pub mod content_links;
pub mod dynamic_link;
pub mod media;
pub mod media_links;
pub mod rewriter;

pub use dynamic_link::DynamicLinkToken;
pub use media::MediaUrlBuilder;
pub use rewriter::LinkTextRewriter;
