pub mod approval;
pub mod employee;
pub mod leave_balance;
pub mod leave_request;
pub mod leave_type;
pub mod process_history;
pub mod role;
