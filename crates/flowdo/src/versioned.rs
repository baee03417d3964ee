// -------------------------------------------------------------------
// Versioned
// -------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Versioned<T> {
    version: u64,
    data: T,
}

impl<T> Versioned<T> {
    pub fn new(data: T) -> Self {
        Self { version: 0, data }
    }
    pub fn get(&self) -> &T {
        &self.data
    }
    pub fn get_mut(&mut self) -> &mut T {
        self.version = self.version.wrapping_add(1);
        &mut self.data
    }
    pub fn set(&mut self, data: T) {
        self.data = data;
        self.version = self.version.wrapping_add(1);
    }
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T: PartialEq> Versioned<T> {
    /// Like `set`, but keeps the version when nothing changed.
    pub fn replace_if_changed(&mut self, data: T) -> bool {
        if self.data == data {
            return false;
        }
        self.set(data);
        true
    }
}

// -------------------------------------------------------------------
// Memoized
// -------------------------------------------------------------------

type KeyFn<S, K> = Box<dyn Fn(&S) -> K>;
type CalcFn<S, V> = Box<dyn Fn(&S) -> V>;

pub struct Memoized<S, K, V> {
    version: u64,
    last: Option<(K, V)>,
    get_key: KeyFn<S, K>,
    calc: CalcFn<S, V>,
}

impl<S, K, V> Memoized<S, K, V>
where
    K: PartialEq,
{
    pub fn new(
        get_key: impl Fn(&S) -> K + 'static,
        calc: impl Fn(&S) -> V + 'static,
    ) -> Self {
        Self {
            version: 0,
            last: None,
            get_key: Box::new(get_key),
            calc: Box::new(calc),
        }
    }

    /// Recompute only if the key changed; return a reference to the cached value.
    pub fn get<'a>(&'a mut self, store: &S) -> &'a V {
        let key = (self.get_key)(store);
        let hit = matches!(&self.last, Some((k, _)) if *k == key);
        if !hit {
            self.version = self.version.wrapping_add(1);
            self.last = Some((key, (self.calc)(store)));
        }
        &self.last.as_ref().expect("cache populated above").1
    }

    /// Incremented each time the value is recomputed.
    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_versioned_bumps_on_write() {
        let mut v = Versioned::new(1);
        assert_eq!(v.version(), 0);
        *v.get_mut() += 1;
        v.set(5);
        assert_eq!((*v.get(), v.version()), (5, 2));
        assert!(!v.replace_if_changed(5));
        assert_eq!(v.version(), 2);
        assert!(v.replace_if_changed(6));
        assert_eq!(v.version(), 3);
    }

    #[test]
    fn test_memoized_recomputes_on_key_change() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut memo = Memoized::new(
            |s: &(u64, i32)| s.0,
            move |s: &(u64, i32)| {
                counter.set(counter.get() + 1);
                s.1 * 2
            },
        );
        assert_eq!(*memo.get(&(1, 10)), 20);
        // Same key: the stale value is served.
        assert_eq!(*memo.get(&(1, 99)), 20);
        assert_eq!(*memo.get(&(2, 99)), 198);
        assert_eq!(calls.get(), 2);
        assert_eq!(memo.version(), 2);
    }
}
