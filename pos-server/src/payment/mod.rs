//! 支付服务客户端 (外部 HTTP 服务)

mod client;

pub use client::{
    CreatePaymentIntent, PaymentClient, PaymentConfig, PaymentIntent, Refund, RefundRequest,
};
