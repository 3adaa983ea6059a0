pub mod checkout_service;
pub mod loyalty;
pub mod loyalty_service;
pub mod pricing_service;
