mod concurrent_bucket;
mod double_commit;
mod happy_path;
mod invocation_failure;
mod late_error_registration;
mod out_of_order_registration;
