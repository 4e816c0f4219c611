pub mod db;

pub use db::{
    account_refs, category_refs, commit_batch, confirmed_between, contact_refs, create_db,
    insert_account, insert_category, insert_contact, insert_sale, insert_transaction,
    list_categories, seed_default_categories, transactions_through, DbPool,
};
