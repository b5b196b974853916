use std::time::Duration;

use futures::executor::block_on;
use uniflow::utils::timer::timeout;
use uniflow::*;

#[derive(Clone, Debug, Default, PartialEq)]
struct Search {
    query: String,
    results: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
enum SearchAction {
    SetQuery(String),
    Results(Vec<String>),
}

struct SearchEnv {
    catalog: Vec<&'static str>,
}

impl Model for Search {
    type Action = SearchAction;
    type Environment = SearchEnv;

    fn update(&mut self, action: SearchAction, env: &SearchEnv) -> Effects<SearchAction> {
        match action {
            SearchAction::SetQuery(query) => {
                self.query = query.clone();
                let catalog = env.catalog.clone();
                Effects::task(move || async move {
                    let hits = catalog
                        .into_iter()
                        .filter(|item| item.contains(query.as_str()))
                        .map(String::from)
                        .collect();
                    SearchAction::Results(hits)
                })
            }
            SearchAction::Results(results) => {
                self.results = results;
                Effects::none()
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct App {
    search: Search,
    edits: u32,
}

#[derive(Clone, Debug, PartialEq, Embed)]
enum AppAction {
    #[embed]
    Search(SearchAction),
    Clear,
}

impl Model for App {
    type Action = AppAction;
    type Environment = SearchEnv;

    fn update(&mut self, action: AppAction, env: &SearchEnv) -> Effects<AppAction> {
        match action {
            AppAction::Search(a) => {
                self.edits += 1;
                self.search.update(a, env).embed()
            }
            AppAction::Clear => {
                self.search = Search::default();
                Effects::none()
            }
        }
    }
}

fn env() -> SearchEnv {
    SearchEnv {
        catalog: vec!["apple", "apricot", "banana"],
    }
}

fn settle<M>(store: &Store<M>)
where
    M: Model + Send + 'static,
    M::Action: std::fmt::Debug,
    M::Environment: Send + Sync + 'static,
{
    block_on(timeout(store.settled(), Duration::from_secs(5))).unwrap();
}

#[test]
fn child_action_matches_standalone_child() {
    let app = Store::new(App::default(), env()).unwrap();
    let standalone = Store::new(Search::default(), env()).unwrap();

    app.send(AppAction::Search(SearchAction::SetQuery("ap".into())));
    standalone.send(SearchAction::SetQuery("ap".into()));
    settle(&app);
    settle(&standalone);

    assert_eq!(app.state().search, *standalone.state());
    assert_eq!(app.state().search.results, vec!["apple", "apricot"]);
    assert_eq!(app.state().edits, 2);
}

#[test]
fn scoped_view_sends_through_parent() {
    let app = Store::new(App::default(), env()).unwrap();
    let search = app.scope::<Search, SearchAction>(|s: &App| &s.search);

    search.send(SearchAction::SetQuery("ban".into()));
    settle(&app);

    assert_eq!(search.with(|s| s.results.clone()), vec!["banana"]);
    assert_eq!(app.state().edits, 2);
    app.send(AppAction::Clear);
    assert_eq!(search.state(), Search::default());
}

#[test]
fn derived_embed_wraps_and_unwraps() {
    let a: AppAction = SearchAction::SetQuery("q".into()).into();
    assert_eq!(a, AppAction::Search(SearchAction::SetQuery("q".into())));
    assert_eq!(a.extract(), Ok(SearchAction::SetQuery("q".into())));
    assert_eq!(
        Embed::<SearchAction>::extract(AppAction::Clear),
        Err(AppAction::Clear)
    );
}
