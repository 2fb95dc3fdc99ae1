pub mod checkout_service;
