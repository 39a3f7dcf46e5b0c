/// Lock a mutex and recover the guard from a poisoned lock instead of
/// panicking.
#[macro_export]
macro_rules! lock {
    ($mutex:expr_2021) => {
        $mutex
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}
