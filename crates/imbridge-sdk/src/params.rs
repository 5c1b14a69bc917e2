//! Parameter and payload types, serialized the way the unit expects them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SdkSettings;

/// Credentials plus optional overrides of the configured [`SdkSettings`].
#[derive(Debug, Clone, Default)]
pub struct LoginParams {
    pub user_id: String,
    pub token: String,
    pub platform_id: Option<i32>,
    pub api_addr: Option<String>,
    pub ws_addr: Option<String>,
    pub log_level: Option<i32>,
    pub is_log_standard_output: Option<bool>,
    pub is_external_extensions: Option<bool>,
}

impl LoginParams {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
            ..Self::default()
        }
    }
}

/// The config object passed to `initSDK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitConfig {
    #[serde(rename = "platformID")]
    pub platform_id: i32,
    pub api_addr: String,
    pub ws_addr: String,
    pub data_dir: String,
    pub log_level: i32,
    pub is_log_standard_output: bool,
    pub log_file_path: String,
    pub is_external_extensions: bool,
}

impl InitConfig {
    pub fn resolve(settings: &SdkSettings, params: &LoginParams) -> Self {
        Self {
            platform_id: params.platform_id.unwrap_or(settings.platform_id),
            api_addr: params.api_addr.clone().unwrap_or_else(|| settings.api_addr.clone()),
            ws_addr: params.ws_addr.clone().unwrap_or_else(|| settings.ws_addr.clone()),
            data_dir: "./".into(),
            log_level: params.log_level.unwrap_or(settings.log_level),
            is_log_standard_output: params
                .is_log_standard_output
                .unwrap_or(settings.is_log_standard_output),
            log_file_path: "./".into(),
            is_external_extensions: params
                .is_external_extensions
                .unwrap_or(settings.is_external_extensions),
        }
    }
}

// User

/// Fields of the logged-in user to change; unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfInfoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(rename = "faceURL", skip_serializing_if = "Option::is_none")]
    pub face_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_recv_msg_opt: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserItem {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(rename = "faceURL", default)]
    pub face_url: String,
    #[serde(default)]
    pub ex: String,
}

// Conversation

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationLookup {
    #[serde(rename = "sourceID")]
    pub source_id: String,
    pub session_type: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OffsetParams {
    pub offset: i64,
    pub count: i64,
}

/// Conversation attributes to change; unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationUpdate {
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recv_msg_opt: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_at_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burn_duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private_chat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_msg_destruct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_destruct_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedHistoryQuery {
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
    #[serde(rename = "startClientMsgID", default)]
    pub start_client_msg_id: String,
    pub count: i64,
    #[serde(default)]
    pub last_min_seq: i64,
}

// Message

/// Offline push shown by mobile clients when the recipient is not connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflinePush {
    pub title: String,
    pub desc: String,
    pub ex: String,
    #[serde(rename = "iOSPushSound")]
    pub ios_push_sound: String,
    #[serde(rename = "iOSBadgeCount")]
    pub ios_badge_count: bool,
}

impl Default for OfflinePush {
    fn default() -> Self {
        Self {
            title: "You have a new message.".into(),
            desc: String::new(),
            ex: String::new(),
            ios_push_sound: "+1".into(),
            ios_badge_count: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SendMessage {
    /// A message object as returned by one of the `create_*_message` calls.
    pub message: Value,
    pub recv_id: String,
    pub group_id: String,
    /// Defaults to [`OfflinePush::default`].
    pub offline_push_info: Option<OfflinePush>,
    pub is_online_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
    #[serde(rename = "clientMsgID")]
    pub client_msg_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureInfo {
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: i64,
    pub width: i64,
    pub height: i64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMessage {
    pub source_path: String,
    pub source_picture: PictureInfo,
    pub big_picture: PictureInfo,
    pub snapshot_picture: PictureInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomMessage {
    pub data: String,
    pub extension: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSearch {
    #[serde(rename = "conversationID", default)]
    pub conversation_id: String,
    pub keyword_list: Vec<String>,
    #[serde(default)]
    pub keyword_list_match_type: i32,
    #[serde(default)]
    pub message_type_list: Vec<i32>,
    #[serde(default)]
    pub search_time_position: i64,
    #[serde(default)]
    pub search_time_period: i64,
    pub page_index: i64,
    pub count: i64,
}

// Friend

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    #[serde(rename = "toUserID")]
    pub to_user_id: String,
    pub req_msg: String,
    #[serde(default)]
    pub ex: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendApplicationResponse {
    #[serde(rename = "toUserID")]
    pub to_user_id: String,
    pub handle_msg: String,
}

/// Attributes to change on several friends at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendsUpdate {
    #[serde(rename = "friendUserIDs")]
    pub friend_user_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ex: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendSearch {
    pub keyword_list: Vec<String>,
    #[serde(rename = "isSearchUserID")]
    pub is_search_user_id: bool,
    pub is_search_nickname: bool,
    pub is_search_remark: bool,
}

// Group

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    #[serde(rename = "memberUserIDs")]
    pub member_user_ids: Vec<String>,
    /// Group attributes (`groupName`, `groupType`, `introduction`, ...).
    pub group_info: Value,
    #[serde(rename = "adminUserIDs", default)]
    pub admin_user_ids: Vec<String>,
    #[serde(rename = "ownerUserID", default)]
    pub owner_user_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct JoinGroup {
    pub group_id: String,
    pub req_msg: String,
    pub join_source: i32,
    pub ex: String,
}

#[derive(Debug, Clone, Default)]
pub struct GroupMembers {
    pub group_id: String,
    pub reason: String,
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupMemberPage {
    pub group_id: String,
    pub filter: i32,
    pub offset: i64,
    pub count: i64,
}
