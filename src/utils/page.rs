// src/utils/page.rs

use axum::{
    Json,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::{
    models::user::CurrentUser,
    utils::session::{Flash, FlashCategory, RequestContext, SessionUpdate, SessionUpdates},
};

/// View model of a rendered page.
///
/// Pending flashes are handed to the client and dropped from the session.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
    pub data: T,
}

impl<T: Serialize> Page<T> {
    pub fn new(ctx: &RequestContext, data: T) -> Self {
        Self {
            user: ctx.user.clone(),
            flashes: ctx.session.flashes.clone(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        let shown_flashes = !self.flashes.is_empty();
        let mut response = Json(self).into_response();
        if shown_flashes {
            response
                .extensions_mut()
                .insert(SessionUpdates(vec![SessionUpdate::TakeFlashes]));
        }
        response
    }
}

/// `303 See Other` answer to a form post, carrying session updates.
#[derive(Debug, Clone)]
pub struct PageRedirect {
    to: String,
    updates: Vec<SessionUpdate>,
}

impl PageRedirect {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            to: path.into(),
            updates: Vec::new(),
        }
    }

    pub fn flash(mut self, category: FlashCategory, message: impl Into<String>) -> Self {
        self.updates.push(SessionUpdate::Flash(Flash {
            category,
            message: message.into(),
        }));
        self
    }

    pub fn update(mut self, update: SessionUpdate) -> Self {
        self.updates.push(update);
        self
    }
}

impl IntoResponse for PageRedirect {
    fn into_response(self) -> Response {
        let mut response = Redirect::to(&self.to).into_response();
        if !self.updates.is_empty() {
            response.extensions_mut().insert(SessionUpdates(self.updates));
        }
        response
    }
}
