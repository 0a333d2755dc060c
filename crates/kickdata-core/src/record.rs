//! Row models for the flat campaign tables exchanged between stages.
//!
//! Monetary amounts stay as strings end to end so exact-row deduplication
//! compares what is actually on disk; only the feature stage parses them.

use serde::{Deserialize, Serialize};

/// One campaign row in the working table.
///
/// `has_campaign_data` is the per-row completion flag: 0 until the campaign's
/// project page has been handled by a collection batch, 1 afterwards. The two
/// creator columns are serde-defaulted so the annotator can read a file that
/// does not carry them yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub blurb: String,
    pub category: String,
    pub country: String,
    pub created_at: i64,
    pub creator_id: String,
    pub deadline: i64,
    pub id: i64,
    pub launched_at: i64,
    pub name: String,
    pub project_url: String,
    pub reward_url: String,
    pub slug: String,
    pub state: String,
    pub usd_goal: String,
    pub usd_pledged: String,
    pub has_campaign_data: u8,
    #[serde(default)]
    pub creator_project_no: u32,
    #[serde(default)]
    pub is_first_project_from_creator: u8,
}

/// Fields scraped from one live campaign project page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignInfo {
    pub project_url: String,
    pub rewards_levels: i64,
    pub rewards_min: i64,
    pub rewards_max: i64,
    pub rewards_mean: i64,
    pub has_one_dollar_reward: u8,
    pub avg_reward_description: i64,
    pub faq: i64,
    pub is_project_we_love: u8,
}

/// A campaign row joined with its scraped page info, as written to the
/// enriched table. Fields are in on-disk column order (alphabetical); the
/// completion flag is not carried over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub avg_reward_description: i64,
    pub blurb: String,
    pub category: String,
    pub country: String,
    pub created_at: i64,
    pub creator_id: String,
    pub creator_project_no: u32,
    pub deadline: i64,
    pub faq: i64,
    pub has_one_dollar_reward: u8,
    pub id: i64,
    pub is_first_project_from_creator: u8,
    pub is_project_we_love: u8,
    pub launched_at: i64,
    pub name: String,
    pub project_url: String,
    pub reward_url: String,
    pub rewards_levels: i64,
    pub rewards_max: i64,
    pub rewards_mean: i64,
    pub rewards_min: i64,
    pub slug: String,
    pub state: String,
    pub usd_goal: String,
    pub usd_pledged: String,
}

impl EnrichedRecord {
    /// Joins a campaign row with the info scraped from its project page.
    #[must_use]
    pub fn from_parts(record: &CampaignRecord, info: &CampaignInfo) -> Self {
        Self {
            avg_reward_description: info.avg_reward_description,
            blurb: record.blurb.clone(),
            category: record.category.clone(),
            country: record.country.clone(),
            created_at: record.created_at,
            creator_id: record.creator_id.clone(),
            creator_project_no: record.creator_project_no,
            deadline: record.deadline,
            faq: info.faq,
            has_one_dollar_reward: info.has_one_dollar_reward,
            id: record.id,
            is_first_project_from_creator: record.is_first_project_from_creator,
            is_project_we_love: info.is_project_we_love,
            launched_at: record.launched_at,
            name: record.name.clone(),
            project_url: record.project_url.clone(),
            reward_url: record.reward_url.clone(),
            rewards_levels: info.rewards_levels,
            rewards_max: info.rewards_max,
            rewards_mean: info.rewards_mean,
            rewards_min: info.rewards_min,
            slug: record.slug.clone(),
            state: record.state.clone(),
            usd_goal: record.usd_goal.clone(),
            usd_pledged: record.usd_pledged.clone(),
        }
    }
}
