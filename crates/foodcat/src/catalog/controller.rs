//! Effect runner for the search session
//!
//! Feeds events into [`foodcat_core::session::update`], executes the commands
//! it returns against a [`CatalogApi`] and feeds the results back in until the
//! session settles.

use foodcat_core::session::{update, Command, Event, SearchSession};
use futures::future::join_all;

use super::CatalogApi;

pub struct Controller<C> {
    api: C,
    session: SearchSession,
}

impl<C: CatalogApi> Controller<C> {
    pub fn new(api: C) -> Self {
        Self {
            api,
            session: SearchSession::default(),
        }
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    /// Apply a single event and run its effects to completion
    ///
    /// Returns the detail path when the event produced a navigation.
    pub async fn dispatch(&mut self, event: Event) -> Option<String> {
        self.dispatch_all(vec![event]).await
    }

    /// Apply a batch of events, then run the resulting effects
    ///
    /// Searches superseded by a later event in the same batch are never sent.
    /// Independent commands issued together (the initial search and the
    /// category load) run concurrently.
    pub async fn dispatch_all(&mut self, events: Vec<Event>) -> Option<String> {
        let mut navigation = None;
        let mut pending = events;

        while !pending.is_empty() {
            let mut commands = Vec::new();
            for event in pending.drain(..) {
                let (next, issued) = update(std::mem::take(&mut self.session), event);
                self.session = next;
                commands.extend(issued);
            }

            let generation = self.session.generation;
            let mut effects = Vec::new();
            for command in commands {
                match command {
                    Command::Navigate(path) => navigation = Some(path),
                    Command::Search(ref request) if request.generation != generation => {
                        log::debug!(
                            "dropping superseded search for page {} (generation {})",
                            request.page,
                            request.generation
                        );
                    }
                    command => effects.push(command),
                }
            }

            pending = join_all(effects.iter().map(|command| self.execute(command)))
                .await
                .into_iter()
                .flatten()
                .collect();
        }

        navigation
    }

    async fn execute(&self, command: &Command) -> Option<Event> {
        match command {
            Command::Search(request) => Some(match self.api.search(request).await {
                Ok(products) => Event::SearchResolved {
                    generation: request.generation,
                    page: request.page,
                    products,
                },
                Err(e) => {
                    log::warn!("search page {} failed: {e}", request.page);
                    Event::SearchFailed {
                        generation: request.generation,
                        page: request.page,
                        message: e.to_string(),
                    }
                }
            }),
            Command::ListCategories => Some(Event::CategoriesResolved(
                self.api.categories().await.unwrap_or_else(|e| {
                    log::warn!("category load failed, continuing without categories: {e}");
                    Vec::new()
                }),
            )),
            Command::Navigate(_) => None,
        }
    }
}
