use im::{OrdMap, Vector};

pub trait OrDefault<K, V> {
    fn get_or_default(&self, item: &K) -> V;
}

impl<K, V> OrDefault<K, V> for OrdMap<K, V>
where
    K: Ord + Clone,
    V: Default + Clone,
{
    fn get_or_default(&self, item: &K) -> V {
        match self.get(item) {
            Some(v) => v.clone(),
            None => V::default(),
        }
    }
}

pub trait AdjustImmut<K, V> {
    /// Applies `f` to the current value (or the default) and returns the updated map.
    fn adjust_or_default<F: FnOnce(V) -> V>(&self, key: K, f: F) -> OrdMap<K, V>;
}

impl<K, V> AdjustImmut<K, V> for OrdMap<K, V>
where
    K: Ord + Clone,
    V: Default + Clone,
{
    fn adjust_or_default<F: FnOnce(V) -> V>(&self, key: K, f: F) -> OrdMap<K, V> {
        let current = self.get_or_default(&key);
        self.update(key, f(current))
    }
}

pub trait PushImmut<T> {
    fn push(&self, item: T) -> Vector<T>;
}

impl<T: Clone> PushImmut<T> for Vector<T> {
    fn push(&self, item: T) -> Vector<T> {
        let mut result = self.clone();
        result.push_back(item);
        result
    }
}
