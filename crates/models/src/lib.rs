//! Domain operations for tasklane.
//!
//! Every operation takes a `&rusqlite::Connection` and runs the query
//! builders from `tasklane_api::db`. Rights checks live beside the
//! operations they guard and are exposed through [`Permissions`].

pub mod assignees;
pub mod auth;
pub mod buckets;
pub mod counts;
pub mod error;
pub mod link_shares;
pub mod lists;
pub mod namespaces;
pub mod rights;
pub mod saved_filters;
pub mod sharing;
mod sq;
pub mod store;
pub mod tasks;
pub mod teams;
pub mod users;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::Auth;
pub use error::{Error, Result};
pub use rights::Permissions;

use tasklane_api::service::Pagination;

/// One page of a collection plus the size of the whole collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    /// Cut a fully loaded collection down to one page.
    pub fn slice(items: Vec<T>, pagination: Pagination) -> Self {
        let total = items.len() as i64;
        let items = match pagination.limit {
            Some(limit) => items
                .into_iter()
                .skip(pagination.offset as usize)
                .take(limit as usize)
                .collect(),
            None => items,
        };
        Self { items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklane_api::service::pagination;

    #[test]
    fn page_slicing() {
        let page = Page::slice((1..=7).collect(), pagination(Some(2), Some(3), 50));
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 7);

        let page = Page::slice((1..=7).collect::<Vec<i32>>(), Pagination::all());
        assert_eq!(page.items.len(), 7);

        let page = Page::slice((1..=2).collect::<Vec<i32>>(), pagination(Some(5), Some(3), 50));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
    }
}
