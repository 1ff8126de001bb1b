// src/utils/guard.rs

use crate::{models::user::CurrentUser, utils::session::RequestContext};

/// Why a request was turned away and where the caller is sent instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub redirect_to: &'static str,
    pub reason: &'static str,
}

/// Requires a signed-in user.
pub fn login_required(ctx: &RequestContext) -> Result<&CurrentUser, Denial> {
    ctx.user.as_ref().ok_or(Denial {
        redirect_to: "/login",
        reason: "Please login to access this page.",
    })
}

/// Requires a signed-in user holding the admin flag.
pub fn admin_required(ctx: &RequestContext) -> Result<&CurrentUser, Denial> {
    let user = login_required(ctx)?;
    if !user.is_admin {
        return Err(Denial {
            redirect_to: "/",
            reason: "Admin access required.",
        });
    }
    Ok(user)
}
