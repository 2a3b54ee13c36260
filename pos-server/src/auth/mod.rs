//! 认证授权模块
//!
//! 身份由外部身份服务签发的 JWT 提供：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文 (基础角色)
//! - [`require_auth`] - 认证中间件
//! - [`require_manager`] - 有效角色为经理 (含临时提权)

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{CurrentUserExt, require_auth, require_manager};
