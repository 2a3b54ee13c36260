//! Payment API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::payment::{CreatePaymentIntent, PaymentConfig, PaymentIntent, Refund, RefundRequest};
use crate::security_log;
use crate::utils::AppResult;

/// GET /api/payments/config - 客户端初始化所需的公开配置
pub async fn config(State(state): State<ServerState>) -> AppResult<Json<PaymentConfig>> {
    let config = state.payments.config().await?;
    Ok(Json(config))
}

/// POST /api/payments/intents - 创建支付意图
pub async fn create_intent(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreatePaymentIntent>,
) -> AppResult<Json<PaymentIntent>> {
    let intent = state.payments.create_payment_intent(&payload).await?;
    tracing::info!(
        user_id = %user.id,
        payment_intent_id = %intent.payment_intent_id,
        amount = payload.amount,
        currency = %payload.currency,
        "Payment intent created"
    );
    Ok(Json(intent))
}

/// POST /api/payments/refunds - 发起退款
pub async fn refund(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<Refund>> {
    let refund = state.payments.refund(&payload).await?;
    security_log!(
        "INFO",
        "refund_requested",
        user_id = user.id.clone(),
        payment_intent_id = payload.payment_intent_id.clone(),
        refund_id = refund.id.clone()
    );
    Ok(Json(refund))
}

/// GET /api/payments/refunds/{id} - 查询退款状态
pub async fn refund_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Refund>> {
    let refund = state.payments.refund_status(&id).await?;
    Ok(Json(refund))
}
