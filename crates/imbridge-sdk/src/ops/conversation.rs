use imbridge_core::{Invocation, OperationError, OperationId, Response};
use serde_json::json;

use crate::params::{AdvancedHistoryQuery, ConversationLookup, ConversationUpdate, OffsetParams};
use crate::sdk::Sdk;

type OpResult = Result<Response, OperationError>;

impl Sdk {
    pub async fn get_all_conversation_list(&self, operation_id: Option<OperationId>) -> OpResult {
        self.invoke(Invocation::new("getAllConversationList").operation_id(operation_id))
            .await
    }

    pub async fn get_all_conversation_id_list(
        &self,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(Invocation::new("getAllConversationIDList").operation_id(operation_id))
            .await
    }

    pub async fn get_conversation_list_split(
        &self,
        page: OffsetParams,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getConversationListSplit")
                .operation_id(operation_id)
                .arg(page.offset)
                .arg(page.count),
        )
        .await
    }

    pub async fn get_one_conversation(
        &self,
        lookup: &ConversationLookup,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getOneConversation")
                .operation_id(operation_id)
                .arg(lookup.session_type)
                .arg(lookup.source_id.as_str()),
        )
        .await
    }

    pub async fn get_multiple_conversation(
        &self,
        conversation_ids: &[String],
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getMultipleConversation")
                .operation_id(operation_id)
                .json_arg(conversation_ids),
        )
        .await
    }

    pub async fn get_advanced_history_message_list(
        &self,
        query: &AdvancedHistoryQuery,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getAdvancedHistoryMessageList")
                .operation_id(operation_id)
                .json_arg(query),
        )
        .await
    }

    pub async fn get_advanced_history_message_list_reverse(
        &self,
        query: &AdvancedHistoryQuery,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getAdvancedHistoryMessageListReverse")
                .operation_id(operation_id)
                .json_arg(query),
        )
        .await
    }

    pub async fn set_conversation(
        &self,
        update: &ConversationUpdate,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("setConversation")
                .operation_id(operation_id)
                .arg(update.conversation_id.as_str())
                .json_arg(update),
        )
        .await
    }

    /// Shorthand for [`Sdk::set_conversation`] with only `isMsgDestruct`.
    pub async fn set_conversation_is_msg_destruct(
        &self,
        conversation_id: &str,
        is_msg_destruct: bool,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("setConversationIsMsgDestruct")
                .entry_point("setConversation")
                .operation_id(operation_id)
                .arg(conversation_id)
                .json_arg(&json!({ "isMsgDestruct": is_msg_destruct })),
        )
        .await
    }

    /// Shorthand for [`Sdk::set_conversation`] with only `msgDestructTime`.
    pub async fn set_conversation_msg_destruct_time(
        &self,
        conversation_id: &str,
        msg_destruct_time: i64,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("setConversationMsgDestructTime")
                .entry_point("setConversation")
                .operation_id(operation_id)
                .arg(conversation_id)
                .json_arg(&json!({ "msgDestructTime": msg_destruct_time })),
        )
        .await
    }

    pub async fn pin_conversation(
        &self,
        conversation_id: &str,
        is_pinned: bool,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("pinConversation")
                .entry_point("setConversation")
                .operation_id(operation_id)
                .arg(conversation_id)
                .json_arg(&json!({ "isPinned": is_pinned })),
        )
        .await
    }

    pub async fn mark_conversation_message_as_read(
        &self,
        conversation_id: &str,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("markConversationMessageAsRead")
                .operation_id(operation_id)
                .arg(conversation_id),
        )
        .await
    }

    pub async fn hide_conversation(
        &self,
        conversation_id: &str,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("hideConversation")
                .operation_id(operation_id)
                .arg(conversation_id),
        )
        .await
    }

    pub async fn delete_conversation_and_delete_all_msg(
        &self,
        conversation_id: &str,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("deleteConversationAndDeleteAllMsg")
                .operation_id(operation_id)
                .arg(conversation_id),
        )
        .await
    }

    pub async fn get_total_unread_msg_count(&self, operation_id: Option<OperationId>) -> OpResult {
        self.invoke(Invocation::new("getTotalUnreadMsgCount").operation_id(operation_id))
            .await
    }
}
