pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod credentials;
pub mod errors;
pub mod output;
pub mod template;

pub use cache::{CacheKey, ClientCache, CLIENT_CACHE_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::NodeExecutionContext;
pub use credentials::{
    AwsCredentials, BundleCredentialResolver, CredentialContext, CredentialResolver,
    CredentialSource, AWS_CREDENTIAL,
};
pub use errors::NodeError;
pub use output::NodeOutput;
