//! Search session state machine
//!
//! The session owns everything the list view shows: the query text, the
//! selected category, the current page, the accumulated products and the sort
//! order. [`update`] is a pure transition function from `(session, event)` to
//! the next session plus the [`Command`]s the shell has to execute. Results of
//! those commands come back in as events.
//!
//! Every query or category change starts a new *generation*. Search requests
//! are tagged with the generation they were issued under, and responses from an
//! older generation are dropped, so a slow response can never overwrite newer
//! results.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::api::{detail_path, normalize_category, validate_barcode, PAGE_SIZE};
use crate::product::{
    is_displayable, sort_categories, transform_products, Category, ProductCard, ProductSummary,
};

/// Ordering applied to the accumulated product list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    None,
    NameAsc,
    NameDesc,
    GradeAsc,
    GradeDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::None,
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::GradeAsc,
        SortKey::GradeDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::None => "none",
            SortKey::NameAsc => "name_asc",
            SortKey::NameDesc => "name_desc",
            SortKey::GradeAsc => "grade_asc",
            SortKey::GradeDesc => "grade_desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::None => "Unsorted",
            SortKey::NameAsc => "Name (A-Z)",
            SortKey::NameDesc => "Name (Z-A)",
            SortKey::GradeAsc => "Nutrition Grade (A-E)",
            SortKey::GradeDesc => "Nutrition Grade (E-A)",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid sort key: {}. Valid keys: none, name_asc, name_desc, grade_asc, grade_desc",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

/// Parameters of a single search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub generation: u64,
    pub page: usize,
    pub term: String,
    pub category: String,
}

/// Effects the shell executes on behalf of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(SearchRequest),
    ListCategories,
    Navigate(String),
}

/// Inputs to the state machine: user actions and fetch results
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Mounted,
    NameSearchSubmitted(String),
    CategoryChanged(String),
    LoadMore,
    SortChanged(SortKey),
    BarcodeSubmitted(String),
    SearchResolved {
        generation: u64,
        page: usize,
        products: Vec<ProductSummary>,
    },
    SearchFailed {
        generation: u64,
        page: usize,
        message: String,
    },
    CategoriesResolved(Vec<Category>),
}

/// Client-visible state of one search session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSession {
    pub query: String,
    pub category: String,
    pub page: usize,
    pub products: Vec<ProductSummary>,
    pub sort: SortKey,
    pub load: LoadState,
    pub fetching_more: bool,
    pub has_more: bool,
    pub error: Option<String>,
    pub generation: u64,
    #[serde(skip)]
    pub categories: Vec<Category>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: String::new(),
            page: 1,
            products: Vec::new(),
            sort: SortKey::None,
            load: LoadState::Loading,
            fetching_more: false,
            has_more: false,
            error: None,
            generation: 0,
            categories: Vec::new(),
        }
    }
}

impl SearchSession {
    /// Products that the list view renders
    pub fn visible_products(&self) -> impl Iterator<Item = &ProductSummary> {
        self.products.iter().filter(|p| is_displayable(p))
    }

    /// Whether a "load more" request would be accepted right now
    pub fn can_load_more(&self) -> bool {
        self.load == LoadState::Ready && self.has_more && !self.fetching_more
    }

    fn search_request(&self, page: usize) -> SearchRequest {
        SearchRequest {
            generation: self.generation,
            page,
            term: self.query.clone(),
            category: self.category.clone(),
        }
    }

    // Start over at page 1 under a fresh generation.
    fn restart(&mut self) -> Command {
        self.generation += 1;
        self.page = 1;
        self.load = LoadState::Loading;
        self.fetching_more = false;
        self.has_more = false;
        self.error = None;
        Command::Search(self.search_request(1))
    }
}

fn compare_names(a: &ProductSummary, b: &ProductSummary) -> Ordering {
    let a = a.name.as_deref().unwrap_or_default();
    let b = b.name.as_deref().unwrap_or_default();
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_grades(a: &ProductSummary, b: &ProductSummary) -> Ordering {
    let a = a.nutrition_grade.as_deref().unwrap_or_default();
    let b = b.nutrition_grade.as_deref().unwrap_or_default();
    a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())
}

/// Reorder products in place
///
/// The sort is stable, so applying the same key twice yields the same order as
/// applying it once. `SortKey::None` leaves the order untouched.
pub fn sort_products(products: &mut [ProductSummary], key: SortKey) {
    match key {
        SortKey::None => {}
        SortKey::NameAsc => products.sort_by(compare_names),
        SortKey::NameDesc => products.sort_by(|a, b| compare_names(b, a)),
        SortKey::GradeAsc => products.sort_by(compare_grades),
        SortKey::GradeDesc => products.sort_by(|a, b| compare_grades(b, a)),
    }
}

/// Serializable snapshot of the list view
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ListOutput {
    pub query: String,
    pub category: String,
    pub page: usize,
    pub sort: SortKey,
    pub has_more: bool,
    pub error: Option<String>,
    pub products: Vec<ProductCard>,
}

/// Build the list view from the current session
pub fn list_output(session: &SearchSession) -> ListOutput {
    ListOutput {
        query: session.query.clone(),
        category: session.category.clone(),
        page: session.page,
        sort: session.sort,
        has_more: session.has_more,
        error: session.error.clone(),
        products: transform_products(&session.products),
    }
}

/// Apply an event to the session
///
/// Returns the next session and the commands to execute, in order.
pub fn update(mut session: SearchSession, event: Event) -> (SearchSession, Vec<Command>) {
    let mut commands = Vec::new();

    match event {
        Event::Mounted => {
            let generation = session.generation;
            session = SearchSession {
                generation,
                ..SearchSession::default()
            };
            commands.push(session.restart());
            commands.push(Command::ListCategories);
        }

        Event::NameSearchSubmitted(query) => {
            session.query = query;
            commands.push(session.restart());
        }

        Event::CategoryChanged(category) => {
            session.category = normalize_category(&category).to_string();
            commands.push(session.restart());
        }

        Event::LoadMore => {
            if session.can_load_more() {
                session.fetching_more = true;
                session.error = None;
                commands.push(Command::Search(session.search_request(session.page + 1)));
            }
        }

        Event::SortChanged(key) => {
            session.sort = key;
            sort_products(&mut session.products, key);
        }

        Event::BarcodeSubmitted(barcode) => {
            if !barcode.is_empty() {
                match validate_barcode(&barcode) {
                    Ok(code) => {
                        session.error = None;
                        commands.push(Command::Navigate(detail_path(code)));
                    }
                    Err(e) => session.error = Some(e.to_string()),
                }
            }
        }

        Event::SearchResolved {
            generation,
            page,
            products,
        } => {
            if generation != session.generation {
                return (session, commands);
            }

            let received = products.len();

            if page == 1 {
                session.products = products;
                session.page = 1;
            } else if session.fetching_more && page == session.page + 1 {
                session.products.extend(products);
                session.page = page;
                session.fetching_more = false;
            } else {
                return (session, commands);
            }

            session.has_more = received >= PAGE_SIZE;
            session.load = LoadState::Ready;
            sort_products(&mut session.products, session.sort);
        }

        Event::SearchFailed {
            generation,
            page,
            message,
        } => {
            if generation != session.generation {
                return (session, commands);
            }

            if page == 1 {
                session.load = LoadState::Failed(message.clone());
                session.error = Some(message);
            } else if session.fetching_more && page == session.page + 1 {
                session.fetching_more = false;
                session.error = Some(message);
            }
        }

        Event::CategoriesResolved(mut categories) => {
            sort_categories(&mut categories);
            session.categories = categories;
        }
    }

    (session, commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(code: &str, name: &str, grade: &str) -> ProductSummary {
        ProductSummary {
            name: Some(name.to_string()),
            nutrition_grade: Some(grade.to_string()),
            code: Some(code.to_string()),
            ..Default::default()
        }
    }

    fn page_of(prefix: &str, count: usize) -> Vec<ProductSummary> {
        (0..count)
            .map(|i| product(&format!("{prefix}{i}"), &format!("{prefix} {i}"), "c"))
            .collect()
    }

    fn search_of(commands: &[Command]) -> &SearchRequest {
        commands
            .iter()
            .find_map(|c| match c {
                Command::Search(req) => Some(req),
                _ => None,
            })
            .expect("a search command")
    }

    /// Mount and resolve the initial search with `count` products
    fn ready_session(count: usize) -> SearchSession {
        let (session, commands) = update(SearchSession::default(), Event::Mounted);
        let generation = search_of(&commands).generation;
        let (session, _) = update(
            session,
            Event::SearchResolved {
                generation,
                page: 1,
                products: page_of("p", count),
            },
        );
        session
    }

    #[test]
    fn test_mounted_issues_initial_search_and_categories() {
        let (session, commands) = update(SearchSession::default(), Event::Mounted);

        assert_eq!(session.load, LoadState::Loading);
        assert_eq!(session.page, 1);
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0],
            Command::Search(SearchRequest {
                generation: session.generation,
                page: 1,
                term: String::new(),
                category: String::new(),
            })
        );
        assert_eq!(commands[1], Command::ListCategories);
    }

    #[test]
    fn test_first_resolution_clears_loading() {
        let session = ready_session(3);

        assert_eq!(session.load, LoadState::Ready);
        assert_eq!(session.products.len(), 3);
        assert!(!session.has_more);
    }

    #[test]
    fn test_name_search_with_all_category() {
        let session = ready_session(24);
        let (session, commands) = update(session, Event::CategoryChanged("all".to_string()));
        let (session, commands2) =
            update(session, Event::NameSearchSubmitted("milk".to_string()));

        assert_eq!(search_of(&commands).category, "");
        let req = search_of(&commands2);
        assert_eq!(req.page, 1);
        assert_eq!(req.term, "milk");
        assert_eq!(req.category, "");

        let (session, _) = update(
            session,
            Event::SearchResolved {
                generation: req.generation,
                page: 1,
                products: page_of("milk", 5),
            },
        );

        assert_eq!(session.page, 1);
        assert_eq!(session.products.len(), 5);
        assert!(session
            .products
            .iter()
            .all(|p| p.code.as_deref().unwrap().starts_with("milk")));
    }

    #[test]
    fn test_page_one_always_replaces() {
        let session = ready_session(24);
        let (session, commands) = update(session, Event::LoadMore);
        let req = search_of(&commands).clone();
        let (session, _) = update(
            session,
            Event::SearchResolved {
                generation: req.generation,
                page: 2,
                products: page_of("q", 24),
            },
        );
        assert_eq!(session.products.len(), 48);

        let (session, commands) = update(session, Event::CategoryChanged("en:snacks".into()));
        let req = search_of(&commands).clone();
        assert_eq!(req.page, 1);
        assert_eq!(req.category, "en:snacks");

        let (session, _) = update(
            session,
            Event::SearchResolved {
                generation: req.generation,
                page: 1,
                products: page_of("s", 2),
            },
        );

        assert_eq!(session.page, 1);
        assert_eq!(session.products.len(), 2);
    }

    #[test]
    fn test_category_change_keeps_query() {
        let session = ready_session(4);
        let (session, _) = update(session, Event::NameSearchSubmitted("tea".into()));
        let (session, commands) = update(session, Event::CategoryChanged("en:teas".into()));

        let req = search_of(&commands);
        assert_eq!(req.term, "tea");
        assert_eq!(req.category, "en:teas");
        assert_eq!(session.query, "tea");
    }

    #[test]
    fn test_load_more_appends_and_increments_page() {
        let session = ready_session(24);
        assert!(session.can_load_more());

        let (session, commands) = update(session, Event::LoadMore);
        let req = search_of(&commands).clone();
        assert_eq!(req.page, 2);
        assert!(session.fetching_more);

        let (session, _) = update(
            session,
            Event::SearchResolved {
                generation: req.generation,
                page: 2,
                products: page_of("next", 10),
            },
        );

        assert_eq!(session.products.len(), 34);
        assert_eq!(session.page, 2);
        assert!(!session.fetching_more);
        assert!(!session.has_more);
    }

    #[test]
    fn test_load_more_ignored_while_in_flight() {
        let session = ready_session(24);
        let (session, first) = update(session, Event::LoadMore);
        let (session, second) = update(session, Event::LoadMore);

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert!(session.fetching_more);
    }

    #[test]
    fn test_short_page_disables_load_more() {
        let session = ready_session(20);

        assert!(!session.has_more);
        let (_, commands) = update(session, Event::LoadMore);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_load_more_ignored_while_loading() {
        let (session, _) = update(SearchSession::default(), Event::Mounted);
        let (_, commands) = update(session, Event::LoadMore);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let session = ready_session(24);
        let (session, old) = update(session, Event::NameSearchSubmitted("old".into()));
        let (session, new) = update(session, Event::NameSearchSubmitted("new".into()));
        let old = search_of(&old).clone();
        let new = search_of(&new).clone();
        assert_ne!(old.generation, new.generation);

        let (session, _) = update(
            session,
            Event::SearchResolved {
                generation: new.generation,
                page: 1,
                products: page_of("new", 3),
            },
        );
        let (session, _) = update(
            session,
            Event::SearchResolved {
                generation: old.generation,
                page: 1,
                products: page_of("old", 7),
            },
        );

        assert_eq!(session.products.len(), 3);
        assert!(session
            .products
            .iter()
            .all(|p| p.code.as_deref().unwrap().starts_with("new")));
    }

    #[test]
    fn test_stale_load_more_is_discarded_after_query_change() {
        let session = ready_session(24);
        let (session, more) = update(session, Event::LoadMore);
        let more = search_of(&more).clone();
        let (session, fresh) = update(session, Event::NameSearchSubmitted("x".into()));
        let fresh = search_of(&fresh).clone();

        let (session, _) = update(
            session,
            Event::SearchResolved {
                generation: fresh.generation,
                page: 1,
                products: page_of("x", 4),
            },
        );
        let (session, _) = update(
            session,
            Event::SearchResolved {
                generation: more.generation,
                page: 2,
                products: page_of("stale", 24),
            },
        );

        assert_eq!(session.products.len(), 4);
        assert_eq!(session.page, 1);
    }

    #[test]
    fn test_initial_failure_surfaces_message() {
        let (session, commands) = update(SearchSession::default(), Event::Mounted);
        let generation = search_of(&commands).generation;
        let (session, _) = update(
            session,
            Event::SearchFailed {
                generation,
                page: 1,
                message: "HTTP 503".into(),
            },
        );

        assert_eq!(session.load, LoadState::Failed("HTTP 503".into()));
    }

    #[test]
    fn test_load_more_failure_keeps_list() {
        let session = ready_session(24);
        let (session, commands) = update(session, Event::LoadMore);
        let req = search_of(&commands).clone();
        let (session, _) = update(
            session,
            Event::SearchFailed {
                generation: req.generation,
                page: 2,
                message: "timeout".into(),
            },
        );

        assert_eq!(session.products.len(), 24);
        assert_eq!(session.page, 1);
        assert!(!session.fetching_more);
        assert_eq!(session.load, LoadState::Ready);
        assert_eq!(session.error.as_deref(), Some("timeout"));
        assert!(session.can_load_more());
    }

    #[test]
    fn test_sort_changed_reorders_without_fetch() {
        let mut session = ready_session(0);
        session.products = vec![
            product("1", "banana", "c"),
            product("2", "Apple", "a"),
            product("3", "cherry", "e"),
        ];

        let (session, commands) = update(session, Event::SortChanged(SortKey::NameAsc));

        assert!(commands.is_empty());
        let names: Vec<&str> = session
            .products
            .iter()
            .map(|p| p.name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_sort_is_idempotent_and_preserves_codes() {
        let original = vec![
            product("1", "b", "c"),
            product("2", "a", "a"),
            product("3", "c", "e"),
            product("4", "a", "b"),
            product("5", "B", "c"),
            ProductSummary::default(),
        ];

        for key in SortKey::ALL {
            let mut once = original.clone();
            sort_products(&mut once, key);
            let mut twice = once.clone();
            sort_products(&mut twice, key);

            assert_eq!(once, twice, "sort {key} is not idempotent");
            assert_eq!(once.len(), original.len());

            let mut codes: Vec<_> = once.iter().map(|p| p.code.clone()).collect();
            let mut expected: Vec<_> = original.iter().map(|p| p.code.clone()).collect();
            codes.sort();
            expected.sort();
            assert_eq!(codes, expected);
        }
    }

    #[test]
    fn test_grade_sort_orders() {
        let mut products = vec![
            product("1", "x", "C"),
            product("2", "y", "a"),
            product("3", "z", "e"),
        ];

        sort_products(&mut products, SortKey::GradeAsc);
        let asc: Vec<_> = products.iter().map(|p| p.code.clone().unwrap()).collect();
        assert_eq!(asc, vec!["2", "1", "3"]);

        sort_products(&mut products, SortKey::GradeDesc);
        let desc: Vec<_> = products.iter().map(|p| p.code.clone().unwrap()).collect();
        assert_eq!(desc, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_active_sort_applies_to_new_results() {
        let session = ready_session(0);
        let (session, _) = update(session, Event::SortChanged(SortKey::NameDesc));
        let (session, commands) = update(session, Event::NameSearchSubmitted("f".into()));
        let req = search_of(&commands).clone();

        let (session, _) = update(
            session,
            Event::SearchResolved {
                generation: req.generation,
                page: 1,
                products: vec![product("1", "apple", "a"), product("2", "fig", "b")],
            },
        );

        assert_eq!(session.products[0].name.as_deref(), Some("fig"));
        assert_eq!(session.sort, SortKey::NameDesc);
    }

    #[test]
    fn test_barcode_navigates_to_exact_path() {
        let session = ready_session(1);
        let (_, commands) = update(session, Event::BarcodeSubmitted("3017620422003".into()));

        assert_eq!(
            commands,
            vec![Command::Navigate("/product/3017620422003".to_string())]
        );
    }

    #[test]
    fn test_empty_barcode_is_ignored() {
        let session = ready_session(1);
        let (session, commands) = update(session, Event::BarcodeSubmitted(String::new()));

        assert!(commands.is_empty());
        assert!(session.error.is_none());
    }

    #[test]
    fn test_invalid_barcode_records_error() {
        let session = ready_session(1);
        let (session, commands) = update(session, Event::BarcodeSubmitted("12/34".into()));

        assert!(commands.is_empty());
        assert!(session.error.unwrap().contains("12/34"));
    }

    #[test]
    fn test_categories_resolved_are_sorted() {
        let session = ready_session(1);
        let categories = vec![
            Category {
                id: "en:teas".into(),
                name: "Teas".into(),
            },
            Category {
                id: "en:beers".into(),
                name: "Beers".into(),
            },
        ];

        let (session, _) = update(session, Event::CategoriesResolved(categories));

        assert_eq!(session.categories[0].name, "Beers");
        assert_eq!(session.categories[1].name, "Teas");
    }

    #[test]
    fn test_visible_products_skip_nameless() {
        let mut session = ready_session(0);
        session.products = vec![product("1", "ok", "a"), ProductSummary::default()];

        assert_eq!(session.visible_products().count(), 1);
    }

    #[test]
    fn test_list_output_renders_visible_products() {
        let mut session = ready_session(0);
        session.products = vec![product("1", "Milk", "b"), ProductSummary::default()];
        session.query = "milk".to_string();

        let output = list_output(&session);

        assert_eq!(output.query, "milk");
        assert_eq!(output.products.len(), 1);
        assert_eq!(output.products[0].grade, "B");
        assert!(!output.has_more);
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("name_asc".parse::<SortKey>(), Ok(SortKey::NameAsc));
        assert_eq!("grade-desc".parse::<SortKey>(), Ok(SortKey::GradeDesc));
        assert_eq!("NONE".parse::<SortKey>(), Ok(SortKey::None));
        assert!("price".parse::<SortKey>().is_err());
    }
}
