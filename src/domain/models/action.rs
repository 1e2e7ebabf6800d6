#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchFilter {
    All,
    Solved,
    Unsolved,
}

/// Entry points exposed to the terminal front-end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SignIn(Option<String>),
    SignOut(),
    Status(),
    Explorer { expand_all: bool },
    Preview(String),
    Open(String),
    Delete { id: String, confirmed: bool },
    Search(SearchFilter),
    Submit(String),
}
