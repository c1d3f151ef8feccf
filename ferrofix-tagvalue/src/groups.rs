/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Repeating-group templates.
//!
//! FIX repeating groups carry no structural markers on the wire: a counting
//! field (`NoXXX`) is followed by `count` repetitions of a fixed field
//! sequence. Decoding therefore needs a caller-supplied field-order template
//! per counting tag; the first member tag delimits entries.

use std::collections::{HashMap, HashSet};

/// Field-order template for one repeating group.
#[derive(Debug, Clone)]
pub struct GroupTemplate {
    /// The NoXXX counting tag introducing the group.
    count_tag: u32,
    /// Member tags in wire order. The first member delimits entries.
    members: Vec<u32>,
}

impl GroupTemplate {
    /// Creates a new group template.
    ///
    /// # Arguments
    /// * `count_tag` - The counting tag (e.g. 268 for NoMDEntries)
    /// * `members` - Member tags in wire order; the first is the entry delimiter
    ///
    /// # Panics
    /// Panics if `members` is empty; a group without a delimiter tag cannot
    /// be decoded positionally.
    #[must_use]
    pub fn new(count_tag: u32, members: Vec<u32>) -> Self {
        assert!(!members.is_empty(), "group template requires member tags");
        Self { count_tag, members }
    }

    /// Returns the counting tag.
    #[inline]
    #[must_use]
    pub const fn count_tag(&self) -> u32 {
        self.count_tag
    }

    /// Returns the entry delimiter tag (first member).
    #[inline]
    #[must_use]
    pub fn delimiter(&self) -> u32 {
        self.members[0]
    }

    /// Returns the member tags in wire order.
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[u32] {
        &self.members
    }

    /// Returns true if the tag belongs to this group.
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.members.contains(&tag)
    }
}

/// Registry of group templates, keyed by counting tag.
///
/// A counting tag may also be declared without a template; encountering it
/// during decode then fails with `UnknownGroup` instead of passing the group
/// members through as flat fields.
#[derive(Debug, Clone, Default)]
pub struct GroupDict {
    templates: HashMap<u32, GroupTemplate>,
    declared: HashSet<u32>,
}

impl GroupDict {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template for its counting tag.
    pub fn register(&mut self, template: GroupTemplate) {
        self.declared.insert(template.count_tag());
        self.templates.insert(template.count_tag(), template);
    }

    /// Declares a tag as a counting tag without supplying a template.
    pub fn declare_counting(&mut self, count_tag: u32) {
        self.declared.insert(count_tag);
    }

    /// Returns the template for a counting tag, if registered.
    #[must_use]
    pub fn template(&self, count_tag: u32) -> Option<&GroupTemplate> {
        self.templates.get(&count_tag)
    }

    /// Returns true if the tag is a known counting tag.
    #[must_use]
    pub fn is_counting(&self, tag: u32) -> bool {
        self.declared.contains(&tag)
    }

    /// Returns the number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no templates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_delimiter() {
        let tpl = GroupTemplate::new(268, vec![269, 270, 271]);
        assert_eq!(tpl.count_tag(), 268);
        assert_eq!(tpl.delimiter(), 269);
        assert!(tpl.contains(270));
        assert!(!tpl.contains(272));
    }

    #[test]
    #[should_panic(expected = "member tags")]
    fn test_template_empty_members() {
        let _ = GroupTemplate::new(268, vec![]);
    }

    #[test]
    fn test_dict_register_and_lookup() {
        let mut dict = GroupDict::new();
        dict.register(GroupTemplate::new(268, vec![269, 270]));

        assert!(dict.is_counting(268));
        assert_eq!(dict.template(268).unwrap().delimiter(), 269);
        assert!(dict.template(146).is_none());
        assert!(!dict.is_counting(146));
    }

    #[test]
    fn test_dict_declared_without_template() {
        let mut dict = GroupDict::new();
        dict.declare_counting(146);

        assert!(dict.is_counting(146));
        assert!(dict.template(146).is_none());
        assert!(dict.is_empty());
    }
}
