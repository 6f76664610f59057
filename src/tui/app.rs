/// Which page is on screen. Route changes stand in for component
/// mount/unmount: entering a route subscribes its queries, leaving it
/// releases them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Article { id: i64 },
    Category { slug: String, page: u32 },
    Search { query: String, page: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomePane {
    Latest,
    Trending,
    Categories,
}

impl HomePane {
    pub fn next(self) -> Self {
        match self {
            HomePane::Latest => HomePane::Trending,
            HomePane::Trending => HomePane::Categories,
            HomePane::Categories => HomePane::Latest,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            HomePane::Latest => HomePane::Categories,
            HomePane::Trending => HomePane::Latest,
            HomePane::Categories => HomePane::Trending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticlePane {
    Body,
    Related,
}

pub struct TuiApp {
    pub route: Route,
    pub history: Vec<Route>,
    pub home_pane: HomePane,
    pub article_pane: ArticlePane,
    pub latest_index: usize,
    pub trending_index: usize,
    pub category_index: usize,
    /// Selection in the category/search result lists.
    pub list_index: usize,
    pub related_index: usize,
    pub body_scroll: u16,
    /// Some while the search prompt is open; holds the text typed so far.
    pub search_input: Option<String>,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl TuiApp {
    pub fn new() -> Self {
        Self {
            route: Route::Home,
            history: Vec::new(),
            home_pane: HomePane::Latest,
            article_pane: ArticlePane::Body,
            latest_index: 0,
            trending_index: 0,
            category_index: 0,
            list_index: 0,
            related_index: 0,
            body_scroll: 0,
            search_input: None,
            status_message: None,
            should_quit: false,
        }
    }

    /// Push the current route onto the history and switch to `route`.
    pub fn navigate(&mut self, route: Route) {
        if route == self.route {
            return;
        }
        let previous = std::mem::replace(&mut self.route, route);
        self.history.push(previous);
        self.reset_page_state();
    }

    /// Pop back to the previous route. Returns false at the history root.
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(route) => {
                self.route = route;
                self.reset_page_state();
                true
            }
            None => false,
        }
    }

    fn reset_page_state(&mut self) {
        self.article_pane = ArticlePane::Body;
        self.list_index = 0;
        self.related_index = 0;
        self.body_scroll = 0;
        self.status_message = None;
    }

    /// The selection index the active pane navigates, if it is list-shaped.
    /// The article body scrolls instead and returns None.
    pub fn selection_mut(&mut self) -> Option<&mut usize> {
        match &self.route {
            Route::Home => Some(match self.home_pane {
                HomePane::Latest => &mut self.latest_index,
                HomePane::Trending => &mut self.trending_index,
                HomePane::Categories => &mut self.category_index,
            }),
            Route::Article { .. } => match self.article_pane {
                ArticlePane::Related => Some(&mut self.related_index),
                ArticlePane::Body => None,
            },
            Route::Category { .. } | Route::Search { .. } => Some(&mut self.list_index),
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}
