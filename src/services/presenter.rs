//! View models for the bookmark page.
//!
//! Rendering is pull-based: the caller asks for a `PageView` built from the
//! current auth state, reconciled list and form state whenever it needs to draw.

use serde::Serialize;

use crate::managers::reconciliation::BookmarkList;
use crate::services::commands::LOGIN_ROUTE;
use crate::types::bookmark::Bookmark;
use crate::types::errors::CommandError;
use crate::types::session::User;

pub const EMPTY_LIST_MESSAGE: &str = "No bookmarks yet. Add one above!";

/// One row of the bookmark list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: String,
    pub title: String,
    pub url: String,
}

impl From<&Bookmark> for ItemView {
    fn from(b: &Bookmark) -> Self {
        Self {
            id: b.id.clone(),
            title: b.title.clone(),
            url: b.url.clone(),
        }
    }
}

/// Renders the list rows, head first.
pub fn render_items(list: &BookmarkList) -> Vec<ItemView> {
    list.snapshot().iter().map(ItemView::from).collect()
}

/// State of the "add bookmark" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub title: String,
    pub url: String,
    pub submitting: bool,
    pub error: Option<String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&mut self, title: &str, url: &str) {
        self.title = title.to_string();
        self.url = url.to_string();
    }

    pub fn begin_submit(&mut self) {
        self.submitting = true;
        self.error = None;
    }

    /// Records a submit result. Clears the inputs on success, keeps them and shows
    /// the error otherwise. Returns the route to redirect to, if any.
    pub fn finish_submit<T>(&mut self, result: &Result<T, CommandError>) -> Option<&'static str> {
        self.submitting = false;
        match result {
            Ok(_) => {
                self.title.clear();
                self.url.clear();
                None
            }
            Err(e) => {
                self.error = Some(e.create_message());
                e.redirect()
            }
        }
    }

    /// Label of the submit button.
    pub fn submit_label(&self) -> &'static str {
        if self.submitting {
            "Adding..."
        } else {
            "Add Bookmark"
        }
    }
}

/// Everything the page needs to draw, or a redirect when nobody is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PageView {
    Redirect {
        location: String,
    },
    Page {
        email: Option<String>,
        form: FormState,
        submit_label: String,
        items: Vec<ItemView>,
        empty_message: Option<String>,
        notice: Option<String>,
    },
}

pub fn render_page(
    user: Option<&User>,
    list: &BookmarkList,
    form: &FormState,
    notice: Option<&str>,
) -> PageView {
    let Some(user) = user else {
        return PageView::Redirect {
            location: LOGIN_ROUTE.to_string(),
        };
    };

    let items = render_items(list);
    let empty_message = items.is_empty().then(|| EMPTY_LIST_MESSAGE.to_string());

    PageView::Page {
        email: user.email.clone(),
        form: form.clone(),
        submit_label: form.submit_label().to_string(),
        items,
        empty_message,
        notice: notice.map(str::to_string),
    }
}
