#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod mock;
mod store;

pub use mock::{MockOAuth2Provider, create_mock_oauth2_service};
pub use store::{MemoryStore, Operation};
