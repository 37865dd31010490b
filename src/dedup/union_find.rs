/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Merges the sets of `a` and `b`. Returns `false` if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }

        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
        true
    }

    pub fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Sets with more than one member, each sorted ascending, ordered by smallest member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: std::collections::BTreeMap<usize, Vec<usize>> = Default::default();
        for x in 0..self.len() {
            let root = self.find(x);
            by_root.entry(root).or_default().push(x);
        }

        let mut groups: Vec<Vec<usize>> = by_root.into_values().filter(|g| g.len() > 1).collect();
        groups.sort_by_key(|g| g[0]);
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons() {
        let mut set = DisjointSet::new(3);
        assert!(!set.connected(0, 1));
        assert!(set.groups().is_empty());
    }

    #[test]
    fn test_union_is_transitive() {
        let mut set = DisjointSet::new(5);
        assert!(set.union(0, 1));
        assert!(set.union(1, 2));
        assert!(!set.union(0, 2));

        assert!(set.connected(0, 2));
        assert!(!set.connected(0, 3));
        assert_eq!(set.groups(), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_groups_sorted() {
        let mut set = DisjointSet::new(6);
        set.union(5, 3);
        set.union(4, 1);

        assert_eq!(set.groups(), vec![vec![1, 4], vec![3, 5]]);
    }
}
