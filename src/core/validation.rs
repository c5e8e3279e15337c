//! Validation states for asynchronously obtained values
//!
//! - `Validated<T>`: a finished request, either `Success` or `Failure`
//! - `Validation<T>`: continuously polled data, which may also be `Loading`
//!
//! Both are closed enums so every call site that eliminates them is checked
//! for exhaustiveness. There is no way to run the two-case eliminator on a
//! `Validation`, since `Loading` has no meaning for a completed request.

use super::error::FetchError;

/// Outcome of a completed request
#[derive(Debug, Clone, PartialEq)]
pub enum Validated<T, E = FetchError> {
    Success(T),
    Failure(E),
}

/// State of a continuously refreshed value
#[derive(Debug, Clone, PartialEq)]
pub enum Validation<T, E = FetchError> {
    Loading,
    Success(T),
    Failure(E),
}

impl<T, E> Validated<T, E> {
    pub fn success(value: T) -> Self {
        Validated::Success(value)
    }

    pub fn failure(error: E) -> Self {
        Validated::Failure(error)
    }

    /// Total case analysis over both outcomes
    pub fn eliminate<R>(self, on_success: impl FnOnce(T) -> R, on_failure: impl FnOnce(E) -> R) -> R {
        match self {
            Validated::Success(value) => on_success(value),
            Validated::Failure(error) => on_failure(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validated<U, E> {
        match self {
            Validated::Success(value) => Validated::Success(f(value)),
            Validated::Failure(error) => Validated::Failure(error),
        }
    }

    /// Success payload, or the result of `fallback`
    pub fn unwrap_or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            Validated::Success(value) => value,
            Validated::Failure(_) => fallback(),
        }
    }

    /// Borrow the payload of a success
    pub fn success_value(&self) -> Option<&T> {
        match self {
            Validated::Success(value) => Some(value),
            Validated::Failure(_) => None,
        }
    }
}

impl<T, E> From<Result<T, E>> for Validated<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Validated::Success(value),
            Err(error) => Validated::Failure(error),
        }
    }
}

impl<T, E> Validation<T, E> {
    pub fn loading() -> Self {
        Validation::Loading
    }

    pub fn success(value: T) -> Self {
        Validation::Success(value)
    }

    pub fn failure(error: E) -> Self {
        Validation::Failure(error)
    }

    /// Total case analysis over all three states
    pub fn eliminate<R>(
        self,
        on_success: impl FnOnce(T) -> R,
        on_failure: impl FnOnce(E) -> R,
        on_loading: impl FnOnce() -> R,
    ) -> R {
        match self {
            Validation::Loading => on_loading(),
            Validation::Success(value) => on_success(value),
            Validation::Failure(error) => on_failure(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validation<U, E> {
        match self {
            Validation::Loading => Validation::Loading,
            Validation::Success(value) => Validation::Success(f(value)),
            Validation::Failure(error) => Validation::Failure(error),
        }
    }

    pub fn unwrap_or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            Validation::Success(value) => value,
            Validation::Loading | Validation::Failure(_) => fallback(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Validation::Loading)
    }
}

impl<T, E> Default for Validation<T, E> {
    fn default() -> Self {
        Validation::Loading
    }
}

impl<T, E> From<Validated<T, E>> for Validation<T, E> {
    fn from(done: Validated<T, E>) -> Self {
        match done {
            Validated::Success(value) => Validation::Success(value),
            Validated::Failure(error) => Validation::Failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eliminate_success_returns_value() {
        for x in [0, 1, -7, i32::MAX] {
            let v: Validated<i32> = Validated::success(x);
            assert_eq!(v.eliminate(|v| v, |_| -1), x);

            let v: Validation<i32> = Validation::success(x);
            assert_eq!(v.eliminate(|v| v, |_| -1, || -2), x);
        }
    }

    #[test]
    fn test_eliminate_failure_and_loading() {
        let v: Validation<i32> = Validation::failure(FetchError::decode("bad"));
        assert_eq!(v.eliminate(|_| "ok", |_| "failed", || "loading"), "failed");

        let v: Validation<i32> = Validation::loading();
        assert_eq!(v.eliminate(|_| "ok", |_| "failed", || "loading"), "loading");
    }

    #[test]
    fn test_map_passes_through_non_success() {
        let loading: Validation<i32> = Validation::Loading;
        assert_eq!(loading.map(|v| v * 2), Validation::Loading);

        let failed: Validation<i32> = Validation::failure(FetchError::network("down"));
        assert_eq!(
            failed.map(|v| v * 2),
            Validation::Failure(FetchError::network("down"))
        );

        let ok: Validated<i32> = Validated::success(21);
        assert_eq!(ok.map(|v| v * 2), Validated::Success(42));
    }

    #[test]
    fn test_unwrap_or_else_only_calls_fallback_when_needed() {
        let ok: Validation<Vec<u8>> = Validation::success(vec![1]);
        assert_eq!(ok.unwrap_or_else(|| panic!("fallback called")), vec![1]);

        let loading: Validation<Vec<u8>> = Validation::Loading;
        assert!(loading.unwrap_or_else(Vec::new).is_empty());

        let failed: Validated<u8> = Validated::failure(FetchError::auth_expired("403"));
        assert_eq!(failed.unwrap_or_else(|| 9), 9);
    }

    #[test]
    fn test_success_value_borrows_payload() {
        let ok: Validated<Vec<u8>> = Validated::success(vec![3]);
        assert_eq!(ok.success_value(), Some(&vec![3]));

        let failed: Validated<Vec<u8>> = Validated::failure(FetchError::network("down"));
        assert_eq!(failed.success_value(), None);
    }

    #[test]
    fn test_validated_converts_into_validation() {
        let done: Validated<&str> = Ok::<_, FetchError>("x").into();
        assert_eq!(Validation::from(done), Validation::Success("x"));
    }
}
