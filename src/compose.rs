//! Right-to-left function composition.

/// A boxed endomorphism, the unit [`compose`] works on.
pub type Composable<T> = Box<dyn Fn(T) -> T + Send + Sync>;

/// Compose functions from right to left.
///
/// `compose(vec![a, b, c])(x)` is `a(b(c(x)))`. No functions give the
/// identity; a single function is returned unchanged.
///
/// # Examples
///
/// ```
/// use sluice::{compose, Composable};
///
/// let double: Composable<i32> = Box::new(|x| x * 2);
/// let square: Composable<i32> = Box::new(|x| x * x);
/// assert_eq!(compose(vec![square, double])(5), 100);
/// ```
pub fn compose<T: 'static>(mut fns: Vec<Composable<T>>) -> Composable<T> {
    if fns.is_empty() {
        return Box::new(|value| value);
    }

    if fns.len() == 1 {
        return fns.remove(0);
    }

    Box::new(move |value| fns.iter().rev().fold(value, |acc, f| f(acc)))
}
