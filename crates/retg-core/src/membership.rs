//! Membership validation across the chat hierarchy.
//!
//! Everyone in a chat is expected to also be in each of its ancestors. The
//! check runs over a members snapshot (chat id -> members) produced outside
//! the bot, since listing participants needs a user client.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt::Write as _,
};

use serde::Deserialize;

use crate::{
    domain::{ChatId, UserId},
    tree::{Chat, ChatTree},
};

/// A user seen in `present_in` but absent from its ancestor `missing_in`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Missing {
    pub user_id: UserId,
    pub missing_in: ChatId,
    pub present_in: ChatId,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Member {
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        match (&self.username, full.is_empty()) {
            (Some(u), true) => format!("@{u}"),
            (Some(u), false) => format!("{full} @{u}"),
            (None, false) => full,
            (None, true) => self.id.0.to_string(),
        }
    }
}

/// Chat id -> members, as read from a snapshot file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct MembersSnapshot(pub HashMap<i64, Vec<Member>>);

impl MembersSnapshot {
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn user_ids(&self) -> HashMap<ChatId, HashSet<UserId>> {
        self.0
            .iter()
            .map(|(chat, members)| (ChatId(*chat), members.iter().map(|m| m.id).collect()))
            .collect()
    }

    pub fn members_by_id(&self) -> HashMap<UserId, &Member> {
        self.0
            .values()
            .flatten()
            .map(|m| (m.id, m))
            .collect()
    }
}

/// Every root-to-leaf path under `root`, pre-order, left to right.
pub fn hierarchy_lines(root: &Chat) -> Vec<Vec<ChatId>> {
    let mut lines = Vec::new();
    let mut stack: Vec<(&Chat, Vec<ChatId>)> = vec![(root, Vec::new())];

    while let Some((chat, mut path)) = stack.pop() {
        path.push(chat.chat_id());
        if chat.child_chats.is_empty() {
            lines.push(path);
            continue;
        }
        // Reversed so the leftmost child is popped first.
        for child in chat.child_chats.iter().rev() {
            stack.push((child, path.clone()));
        }
    }

    lines
}

/// Users present in a chat but missing from one of its ancestors.
///
/// Chats absent from `members` count as empty. Pairs shared by several
/// lines are reported once per line; [`MembershipReport`] folds them.
pub fn find_missing(tree: &ChatTree, members: &HashMap<ChatId, HashSet<UserId>>) -> Vec<Missing> {
    let empty = HashSet::new();
    let users_of = |chat: &ChatId| members.get(chat).unwrap_or(&empty);

    let mut out = Vec::new();
    for line in tree.chats.iter().flat_map(hierarchy_lines) {
        for (i, ancestor) in line.iter().enumerate() {
            let ancestor_users = users_of(ancestor);
            for descendant in &line[i..] {
                let mut missing: Vec<UserId> = users_of(descendant)
                    .difference(ancestor_users)
                    .copied()
                    .collect();
                missing.sort();
                out.extend(missing.into_iter().map(|user_id| Missing {
                    user_id,
                    missing_in: *ancestor,
                    present_in: *descendant,
                }));
            }
        }
    }

    out
}

/// Missing memberships grouped by user, then by the chat they are missing in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MembershipReport {
    pub users: BTreeMap<UserId, BTreeMap<ChatId, BTreeSet<ChatId>>>,
}

impl MembershipReport {
    pub fn build(missing: &[Missing]) -> Self {
        let mut users: BTreeMap<UserId, BTreeMap<ChatId, BTreeSet<ChatId>>> = BTreeMap::new();
        for m in missing {
            users
                .entry(m.user_id)
                .or_default()
                .entry(m.missing_in)
                .or_default()
                .insert(m.present_in);
        }
        Self { users }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Human-readable listing; chats are named by their first alias.
    pub fn render(&self, tree: &ChatTree, members: &HashMap<UserId, &Member>) -> String {
        let chat_name = |id: &ChatId| {
            tree.find_chat(*id)
                .map(Chat::display_name)
                .unwrap_or_else(|| id.to_string())
        };

        let mut out = String::new();
        for (user_id, chats) in &self.users {
            let name = members
                .get(user_id)
                .map(|m| m.display_name())
                .unwrap_or_else(|| user_id.0.to_string());
            let _ = writeln!(out, "User \"{name}\" is missing in:");

            for (missing_in, present_in) in chats {
                let present = present_in
                    .iter()
                    .map(|id| format!("\"{}\"", chat_name(id)))
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(
                    out,
                    "\t\"{}\" even though they are in {present}",
                    chat_name(missing_in)
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(lines: Vec<Vec<ChatId>>) -> Vec<Vec<i64>> {
        lines
            .into_iter()
            .map(|l| l.into_iter().map(|c| c.0).collect())
            .collect()
    }

    #[test]
    fn chat_without_children_is_a_single_line() {
        assert_eq!(ids(hierarchy_lines(&Chat::new(123, &["First"]))), vec![vec![123]]);
    }

    #[test]
    fn one_line_per_leaf_in_order() {
        let chat = Chat::new(1, &["Root"]).with_children(vec![
            Chat::new(10, &["A"]).with_children(vec![Chat::new(100, &["AA"]), Chat::new(101, &["AB"])]),
            Chat::new(11, &["B"]),
        ]);
        assert_eq!(
            ids(hierarchy_lines(&chat)),
            vec![vec![1, 10, 100], vec![1, 10, 101], vec![1, 11]]
        );
    }

    fn members(entries: &[(i64, &[i64])]) -> HashMap<ChatId, HashSet<UserId>> {
        entries
            .iter()
            .map(|(chat, users)| (ChatId(*chat), users.iter().map(|u| UserId(*u)).collect()))
            .collect()
    }

    fn tree() -> ChatTree {
        ChatTree::new(
            vec![Chat::new(1, &["Root"]).with_children(vec![
                Chat::new(10, &["Child"]).with_children(vec![Chat::new(100, &["Grandchild"])]),
                Chat::new(11, &["Other"]),
            ])],
            vec![],
        )
    }

    #[test]
    fn finds_users_missing_in_ancestors() {
        let m = members(&[(1, &[1, 2]), (10, &[1, 2, 3]), (100, &[3, 4]), (11, &[2])]);
        let mut missing = find_missing(&tree(), &m);
        missing.sort();
        missing.dedup();

        let pairs: Vec<(i64, i64, i64)> = missing
            .iter()
            .map(|m| (m.user_id.0, m.missing_in.0, m.present_in.0))
            .collect();
        assert_eq!(
            pairs,
            vec![(3, 1, 10), (3, 1, 100), (4, 1, 100), (4, 10, 100)]
        );
    }

    #[test]
    fn complete_memberships_report_nothing() {
        let m = members(&[(1, &[1, 2, 3]), (10, &[1, 2]), (100, &[2]), (11, &[3])]);
        assert!(find_missing(&tree(), &m).is_empty());
    }

    #[test]
    fn unknown_chats_count_as_empty() {
        let m = members(&[(100, &[7])]);
        let report = MembershipReport::build(&find_missing(&tree(), &m));

        let user = &report.users[&UserId(7)];
        assert_eq!(user.keys().copied().collect::<Vec<_>>(), vec![ChatId(1), ChatId(10)]);
    }

    #[test]
    fn report_folds_repeats_and_renders_aliases() {
        let tree = ChatTree::new(
            vec![Chat::new(1, &["Root"]).with_children(vec![
                Chat::new(10, &["Child"]).with_children(vec![Chat::new(100, &["Leaf1"]), Chat::new(101, &["Leaf2"])]),
            ])],
            vec![],
        );
        let m = members(&[(1, &[]), (10, &[5]), (100, &[5]), (101, &[5])]);
        let missing = find_missing(&tree, &m);
        // Root<-Child is seen once per line.
        assert_eq!(
            missing.iter().filter(|m| m.missing_in == ChatId(1) && m.present_in == ChatId(10)).count(),
            2
        );

        let report = MembershipReport::build(&missing);
        let member = Member {
            id: UserId(5),
            username: Some("petro".to_string()),
            first_name: Some("Petro".to_string()),
            last_name: None,
        };
        let by_id = HashMap::from([(UserId(5), &member)]);

        assert_eq!(
            report.render(&tree, &by_id),
            "User \"Petro @petro\" is missing in:\n\t\"Root\" even though they are in \"Child\", \"Leaf1\", \"Leaf2\"\n"
        );
    }

    #[test]
    fn parses_snapshot() {
        let raw = r#"{"-100": [{"id": 1, "username": "a"}, {"id": 2}], "7": []}"#;
        let snapshot = MembersSnapshot::from_json(raw).unwrap();

        let users = snapshot.user_ids();
        assert_eq!(users[&ChatId(-100)].len(), 2);
        assert!(users[&ChatId(7)].is_empty());
        assert_eq!(snapshot.members_by_id()[&UserId(1)].display_name(), "@a");
        assert_eq!(snapshot.members_by_id()[&UserId(2)].display_name(), "2");
    }
}
