pub use oid4vc_core;
pub use oid4vci;
pub use oid4vp;
pub use wallet_manager;
