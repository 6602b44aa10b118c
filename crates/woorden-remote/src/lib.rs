pub mod auth;
pub mod client;
pub mod loaders;
pub mod supabase;
pub mod types;

pub use auth::{AuthUser, Session, SignUpOutcome};
pub use client::{RemoteClient, SelectQuery};
pub use supabase::SupabaseClient;
pub use types::{QuizScore, RemoteCollection, RemoteCollectionWithWords, RemoteWord};
