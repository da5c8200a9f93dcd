//! Collection views over the vertices or edges of a resource.
//!
//! A view is either dynamic ("all elements of a kind", re-reading the live
//! bounds on every call) or a fixed subset whose membership never changes
//! after creation. Either form may carry attribute predicates, evaluated
//! lazily per element while iterating. Filtered views keep a cached index
//! mapping keyed by the resource generation it was computed at.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::{
    backref::{BackRef, Generation},
    errors::GraphError,
    filter::Predicate,
    graph::ElementKind,
    handle::ElementHandle,
};

pub(crate) struct SeqInner {
    link: BackRef,
    kind: ElementKind,
    members: Option<Vec<usize>>,
    predicates: Vec<Predicate>,
    matched: RefCell<Option<(Generation, Vec<usize>)>>,
}

impl SeqInner {
    pub(crate) fn link(&self) -> &BackRef {
        &self.link
    }

    pub(crate) fn clear_link(&self) {
        self.link.clear();
        self.matched.replace(None);
    }
}

/// A vertex or edge collection view. See [`VertexSeq`] and [`EdgeSeq`].
#[derive(Clone)]
pub struct Seq {
    inner: Rc<SeqInner>,
}

pub type VertexSeq = Seq;
pub type EdgeSeq = Seq;

impl Seq {
    /// View over every current element of `kind`.
    pub fn all(link: BackRef, kind: ElementKind) -> Self {
        Self::build(link, kind, None, Vec::new())
    }

    /// View over a fixed set of indices, validated against the bounds at
    /// creation time only.
    pub fn subset(
        link: &BackRef,
        kind: ElementKind,
        indices: &[usize],
    ) -> Result<Self, GraphError> {
        let link = link.rebind()?;
        let bounds = link.resolve()?.state()?.bounds();
        for &index in indices {
            bounds
                .check(kind, index)
                .map_err(|e| GraphError::invalid_operation(format!("subset: {e}")))?;
        }
        Ok(Self::build(link, kind, Some(indices.to_vec()), Vec::new()))
    }

    pub(crate) fn from_inner(inner: Rc<SeqInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<SeqInner> {
        Rc::downgrade(&self.inner)
    }

    fn build(
        link: BackRef,
        kind: ElementKind,
        members: Option<Vec<usize>>,
        predicates: Vec<Predicate>,
    ) -> Self {
        Self {
            inner: Rc::new(SeqInner {
                link,
                kind,
                members,
                predicates,
                matched: RefCell::new(None),
            }),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.inner.kind
    }

    pub fn link(&self) -> &BackRef {
        &self.inner.link
    }

    pub fn is_subset(&self) -> bool {
        self.inner.members.is_some()
    }

    pub fn is_filtered(&self) -> bool {
        !self.inner.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.inner.predicates
    }

    /// Whether two views share the same underlying object.
    pub fn same_view(&self, other: &Seq) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of elements. Dynamic views read the live bounds on every call;
    /// unfiltered subsets always report their fixed size.
    pub fn count(&self) -> Result<usize, GraphError> {
        if self.is_filtered() {
            return Ok(self.matching()?.len());
        }
        match &self.inner.members {
            Some(members) => Ok(members.len()),
            None => Ok(self.inner.link.resolve()?.state()?.bounds().of(self.inner.kind)),
        }
    }

    pub fn len(&self) -> Result<usize, GraphError> {
        self.count()
    }

    pub fn is_empty(&self) -> Result<bool, GraphError> {
        Ok(self.count()? == 0)
    }

    /// Lazy pass over the view. Every call starts a fresh pass; dynamic views
    /// take their bounds when the pass starts.
    pub fn iter(&self) -> SeqIter {
        SeqIter {
            seq: self.clone(),
            cursor: Cursor::Pending,
        }
    }

    /// Handle for the `position`-th element of an unfiltered view.
    pub fn get(&self, position: usize) -> Result<ElementHandle, GraphError> {
        if self.is_filtered() {
            let matched = self.matching()?;
            let index = *matched.get(position).ok_or_else(|| {
                GraphError::out_of_range(format!(
                    "position {position} outside 0..{}",
                    matched.len()
                ))
            })?;
            let handle = ElementHandle::new(self.inner.link.rebind()?, index, self.inner.kind);
            handle.check()?;
            return Ok(handle);
        }
        let handle = match &self.inner.members {
            Some(members) => {
                let index = *members.get(position).ok_or_else(|| {
                    GraphError::out_of_range(format!(
                        "position {position} outside 0..{}",
                        members.len()
                    ))
                })?;
                ElementHandle::new(self.inner.link.clone(), index, self.inner.kind)
            }
            None => ElementHandle::new(self.inner.link.rebind()?, position, self.inner.kind),
        };
        handle.check()?;
        Ok(handle)
    }

    /// Narrows the view with another predicate. The result is a new view; this
    /// one is unchanged.
    pub fn filter(&self, predicate: Predicate) -> Seq {
        let mut predicates = self.inner.predicates.clone();
        predicates.push(predicate);
        Self::build(
            self.inner.link.clone(),
            self.inner.kind,
            self.inner.members.clone(),
            predicates,
        )
    }

    /// `select(age_gt = 3)` style filtering.
    pub fn select(&self, keyword: &str, literal: Value) -> Result<Seq, GraphError> {
        Ok(self.filter(Predicate::from_keyword(keyword, literal)?))
    }

    /// Current indices of the elements in the view.
    pub fn indices(&self) -> Result<Vec<usize>, GraphError> {
        if self.is_filtered() {
            return self.matching();
        }
        self.iter().map(|item| item?.current_index()).collect()
    }

    /// Values of one attribute across the view, `Null` where unset.
    pub fn attribute_values(&self, name: &str) -> Result<Vec<Value>, GraphError> {
        self.iter()
            .map(|item| Ok(item?.attribute(name)?.unwrap_or(Value::Null)))
            .collect()
    }

    pub(crate) fn release_link(&self) {
        self.inner.clear_link();
    }

    fn matching(&self) -> Result<Vec<usize>, GraphError> {
        let generation = self.inner.link.resolve()?.generation();
        if let Some((cached_at, cached)) = self.inner.matched.borrow().as_ref() {
            if *cached_at == generation {
                return Ok(cached.clone());
            }
        }
        let mut matched = Vec::new();
        for item in self.iter() {
            matched.push(item?.current_index()?);
        }
        tracing::trace!(
            resource = %self.inner.link.resource_id(),
            %generation,
            matched = matched.len(),
            "recomputed filtered view"
        );
        self.inner.matched.replace(Some((generation, matched.clone())));
        Ok(matched)
    }

    fn accepts(&self, handle: &ElementHandle) -> Result<bool, GraphError> {
        for predicate in &self.inner.predicates {
            let value = handle.attribute(&predicate.attribute)?;
            if !predicate.matches(value.as_ref()) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Debug for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seq")
            .field("kind", &self.inner.kind)
            .field("link", &self.inner.link)
            .field("members", &self.inner.members)
            .field("predicates", &self.inner.predicates.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a Seq {
    type Item = Result<ElementHandle, GraphError>;
    type IntoIter = SeqIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

enum Cursor {
    Pending,
    Dynamic { link: BackRef, next: usize, end: usize },
    Members { next: usize },
    Done,
}

/// Iterator returned by [`Seq::iter`]. Items are validated as they are
/// produced, so stale elements show up as `Err` items rather than gaps.
pub struct SeqIter {
    seq: Seq,
    cursor: Cursor,
}

impl SeqIter {
    fn start(&mut self) -> Result<(), GraphError> {
        self.cursor = match &self.seq.inner.members {
            Some(_) => Cursor::Members { next: 0 },
            None => {
                let link = self.seq.inner.link.rebind()?;
                let end = link.resolve()?.state()?.bounds().of(self.seq.inner.kind);
                Cursor::Dynamic { link, next: 0, end }
            }
        };
        Ok(())
    }

    fn next_candidate(&mut self) -> Option<ElementHandle> {
        let kind = self.seq.inner.kind;
        match &mut self.cursor {
            Cursor::Dynamic { link, next, end } if *next < *end => {
                let handle = ElementHandle::new(link.clone(), *next, kind);
                *next += 1;
                Some(handle)
            }
            Cursor::Members { next } => {
                let members = self.seq.inner.members.as_deref().unwrap_or(&[]);
                let index = *members.get(*next)?;
                *next += 1;
                Some(ElementHandle::new(self.seq.inner.link.clone(), index, kind))
            }
            _ => None,
        }
    }
}

impl Iterator for SeqIter {
    type Item = Result<ElementHandle, GraphError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.cursor, Cursor::Pending) {
            if let Err(err) = self.start() {
                self.cursor = Cursor::Done;
                return Some(Err(err));
            }
        }
        loop {
            let Some(handle) = self.next_candidate() else {
                self.cursor = Cursor::Done;
                return None;
            };
            if let Err(err) = handle.check() {
                return Some(Err(err));
            }
            match self.seq.accepts(&handle) {
                Ok(true) => return Some(Ok(handle)),
                Ok(false) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
