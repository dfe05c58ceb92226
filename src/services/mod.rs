pub mod follows;
pub mod ingredients;
pub mod memberships;
pub mod recipes;
pub mod shopping_list;
pub mod short_link;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
