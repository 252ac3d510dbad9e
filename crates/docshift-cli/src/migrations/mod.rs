//! Migrations compiled into the `docshift` binary.

mod add_default_data;
mod create_users_collection;

use std::sync::Arc;

use docshift_engine::Migration;

pub use add_default_data::AddDefaultData;
pub use create_users_collection::CreateUsersCollection;

pub fn builtin() -> Vec<Arc<dyn Migration>> {
    vec![
        Arc::new(CreateUsersCollection),
        Arc::new(AddDefaultData),
    ]
}
