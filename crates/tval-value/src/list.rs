//! List edits.
//!
//! Every list edit is a [`splice`](TypedValue::splice): replace a
//! contiguous run of elements with new ones, each validated against the
//! element signature first. All of them return the new root.

use std::sync::Arc;

use tval_core::{AccessError, TvalError};
use tval_schema::TypeSignature;

use crate::input::Input;
use crate::lift::lift_input;
use crate::node::{Node, Slot};
use crate::value::TypedValue;

impl TypedValue {
    fn list_parts(&self, operation: &str) -> Result<(&Arc<TypeSignature>, &[Slot]), TvalError> {
        match (self.signature().element(), self.node()) {
            (Some(element), Node::List(items)) => Ok((element, items)),
            _ => Err(self.wrong_kind(operation)),
        }
    }

    /// Replace up to `length` elements starting at `offset` with
    /// `replacement`.
    ///
    /// `offset` may equal the length (append); `length` is clamped to the
    /// elements available.
    ///
    /// # Errors
    ///
    /// `AccessError::OutOfRange` if `offset` is past the end,
    /// `TvalError::Validation` if a replacement element does not match the
    /// element signature, `AccessError::WrongKind` if this is not a list.
    pub fn splice<I>(&self, offset: usize, length: usize, replacement: I) -> Result<TypedValue, TvalError>
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        let (element, items) = self.list_parts("splice")?;
        if offset > items.len() {
            return Err(AccessError::OutOfRange {
                offset,
                len: items.len(),
            }
            .into());
        }
        let end = offset + length.min(items.len() - offset);

        let base = self.path();
        let mut inserted = Vec::new();
        for (i, item) in replacement.into_iter().enumerate() {
            let mut path = base.child(offset + i);
            inserted.push(lift_input(element, item.into(), &mut path)?);
        }

        let mut next = Vec::with_capacity(items.len() - (end - offset) + inserted.len());
        next.extend_from_slice(&items[..offset]);
        next.extend(inserted);
        next.extend_from_slice(&items[end..]);
        self.commit(Node::List(next))
    }

    /// Append elements.
    pub fn push<I>(&self, items: I) -> Result<TypedValue, TvalError>
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        let len = self.list_parts("push")?.1.len();
        self.splice(len, 0, items)
    }

    /// Prepend elements.
    pub fn unshift<I>(&self, items: I) -> Result<TypedValue, TvalError>
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        self.list_parts("unshift")?;
        self.splice(0, 0, items)
    }

    /// Remove the last `n` elements.
    ///
    /// # Errors
    ///
    /// `AccessError::OutOfRange` if the list has fewer than `n` elements.
    pub fn pop(&self, n: usize) -> Result<TypedValue, TvalError> {
        let len = self.list_parts("pop")?.1.len();
        let offset = len.checked_sub(n).ok_or(AccessError::OutOfRange { offset: n, len })?;
        self.splice(offset, n, std::iter::empty::<Input>())
    }

    /// Remove the first `n` elements.
    pub fn shift(&self, n: usize) -> Result<TypedValue, TvalError> {
        let len = self.list_parts("shift")?.1.len();
        if n > len {
            return Err(AccessError::OutOfRange { offset: n, len }.into());
        }
        self.splice(0, n, std::iter::empty::<Input>())
    }
}
