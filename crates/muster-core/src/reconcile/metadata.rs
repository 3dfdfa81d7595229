use super::{scalar_text, ReconcilePolicy, SnapshotPair};
use muster_models::snapshot::{IdentityKeys, ParsedSnapshot};

/// Contextual fields carried on a change report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    ActionDescription,
    ChangeDescription,
    FollowUpMethod,
    FollowUpAction,
    Notes,
}

/// A place a contextual field may be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The audit metadata sub-object embedded in the snapshot.
    AuditMetadata,
    /// The same-named field at the top level of the snapshot.
    TopLevel,
    /// The entry's raw action name.
    RawAction,
}

const ACTION_CHAIN: &[Source] = &[Source::AuditMetadata, Source::TopLevel, Source::RawAction];
const SNAPSHOT_CHAIN: &[Source] = &[Source::AuditMetadata, Source::TopLevel];

impl ContextField {
    pub const ALL: [ContextField; 5] = [
        ContextField::ActionDescription,
        ContextField::ChangeDescription,
        ContextField::FollowUpMethod,
        ContextField::FollowUpAction,
        ContextField::Notes,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ContextField::ActionDescription => "actionDescription",
            ContextField::ChangeDescription => "changeDescription",
            ContextField::FollowUpMethod => "followUpMethod",
            ContextField::FollowUpAction => "followUpAction",
            ContextField::Notes => "notes",
        }
    }

    /// Sources consulted for this field, highest priority first.
    pub fn chain(self) -> &'static [Source] {
        match self {
            ContextField::ActionDescription => ACTION_CHAIN,
            _ => SNAPSHOT_CHAIN,
        }
    }
}

/// Inputs shared by every source lookup for one entry.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub snapshot: Option<&'a ParsedSnapshot>,
    pub action: &'a str,
    pub metadata_key: &'a str,
}

impl Source {
    pub fn lookup(self, field: ContextField, ctx: &ResolveContext<'_>) -> Option<String> {
        match self {
            Source::AuditMetadata => ctx
                .snapshot?
                .metadata(ctx.metadata_key)?
                .get(field.key())
                .and_then(scalar_text),
            Source::TopLevel => ctx.snapshot?.get(field.key()).and_then(scalar_text),
            Source::RawAction => {
                let action = ctx.action.trim();
                (!action.is_empty()).then(|| action.to_string())
            }
        }
    }
}

/// Try each source of `chain` in order and keep the first usable value.
pub fn resolve_with(
    chain: &[Source],
    field: ContextField,
    ctx: &ResolveContext<'_>,
) -> Option<String> {
    chain.iter().find_map(|source| source.lookup(field, ctx))
}

pub fn resolve(field: ContextField, ctx: &ResolveContext<'_>) -> Option<String> {
    resolve_with(field.chain(), field, ctx)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextFields {
    pub action_description: Option<String>,
    pub change_description: Option<String>,
    pub follow_up_method: Option<String>,
    pub follow_up_action: Option<String>,
    pub notes: Option<String>,
}

pub fn extract(pair: &SnapshotPair<'_>, action: &str, policy: &ReconcilePolicy) -> ContextFields {
    let ctx = ResolveContext {
        snapshot: pair.primary(),
        action,
        metadata_key: &policy.metadata_key,
    };
    let mut fields = ContextFields::default();
    for field in ContextField::ALL {
        let value = resolve(field, &ctx);
        match field {
            ContextField::ActionDescription => fields.action_description = value,
            ContextField::ChangeDescription => fields.change_description = value,
            ContextField::FollowUpMethod => fields.follow_up_method = value,
            ContextField::FollowUpAction => fields.follow_up_action = value,
            ContextField::Notes => fields.notes = value,
        }
    }
    fields
}

/// Human label for the affected record, e.g. `"Food Bank - Mary Ujda"`.
///
/// Each identity field falls back to the secondary snapshot on its own, so a
/// first name from one snapshot can pair with a last name from the other.
pub fn subject_label(pair: &SnapshotPair<'_>, keys: &IdentityKeys) -> Option<String> {
    let first = pair.find(|snap| snap.first_str(&keys.first_name));
    let last = pair.find(|snap| snap.first_str(&keys.last_name));
    let organization = pair.find(|snap| snap.first_str(&keys.organization));

    let name = match (first, last) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    };

    match (organization, name) {
        (Some(org), Some(name)) => Some(format!("{org} - {name}")),
        (Some(org), None) => Some(org.to_string()),
        (None, name) => name,
    }
}
