use imbridge_core::decode::transforms;
use imbridge_core::{Invocation, OperationError, OperationId, Response};

use crate::params::{CustomMessage, ImageMessage, LocalSearch, MessageRef, SendMessage};
use crate::sdk::Sdk;

type OpResult = Result<Response, OperationError>;

impl Sdk {
    // Message constructors answer with a one-element list; older callers
    // expect the bare message.

    pub async fn create_text_message(
        &self,
        text: &str,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("createTextMessage")
                .operation_id(operation_id)
                .arg(text)
                .transform(transforms::first_element),
        )
        .await
    }

    pub async fn create_image_message_by_url(
        &self,
        image: &ImageMessage,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(image_invocation("createImageMessageByURL", image, operation_id))
            .await
    }

    /// Same as [`Sdk::create_image_message_by_url`]; the unit resolves the
    /// file from the picture's `uuid`.
    pub async fn create_image_message_by_file(
        &self,
        image: &ImageMessage,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            image_invocation("createImageMessageByFile", image, operation_id)
                .entry_point("createImageMessageByURL"),
        )
        .await
    }

    pub async fn create_custom_message(
        &self,
        custom: &CustomMessage,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("createCustomMessage")
                .operation_id(operation_id)
                .arg(custom.data.as_str())
                .arg(custom.extension.as_str())
                .arg(custom.description.as_str())
                .transform(transforms::first_element),
        )
        .await
    }

    pub async fn send_message(
        &self,
        params: &SendMessage,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(send_invocation("sendMessage", params, operation_id))
            .await
    }

    /// Like [`Sdk::send_message`], for messages whose media is already uploaded.
    pub async fn send_message_not_oss(
        &self,
        params: &SendMessage,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(send_invocation("sendMessageNotOss", params, operation_id))
            .await
    }

    pub async fn revoke_message(
        &self,
        message: &MessageRef,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("revokeMessage")
                .operation_id(operation_id)
                .arg(message.conversation_id.as_str())
                .arg(message.client_msg_id.as_str()),
        )
        .await
    }

    pub async fn delete_message(
        &self,
        message: &MessageRef,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("deleteMessage")
                .operation_id(operation_id)
                .arg(message.conversation_id.as_str())
                .arg(message.client_msg_id.as_str()),
        )
        .await
    }

    pub async fn set_message_local_ex(
        &self,
        message: &MessageRef,
        local_ex: &str,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("setMessageLocalEx")
                .operation_id(operation_id)
                .arg(message.conversation_id.as_str())
                .arg(message.client_msg_id.as_str())
                .arg(local_ex),
        )
        .await
    }

    pub async fn search_local_messages(
        &self,
        search: &LocalSearch,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("searchLocalMessages")
                .operation_id(operation_id)
                .json_arg(search),
        )
        .await
    }
}

fn image_invocation(
    operation: &str,
    image: &ImageMessage,
    operation_id: Option<OperationId>,
) -> Invocation {
    Invocation::new(operation)
        .operation_id(operation_id)
        .arg(image.source_path.as_str())
        .json_arg(&image.source_picture)
        .json_arg(&image.big_picture)
        .json_arg(&image.snapshot_picture)
        .transform(transforms::first_element)
}

fn send_invocation(
    operation: &str,
    params: &SendMessage,
    operation_id: Option<OperationId>,
) -> Invocation {
    let offline_push_info = params.offline_push_info.clone().unwrap_or_default();
    Invocation::new(operation)
        .operation_id(operation_id)
        .json_arg(&params.message)
        .arg(params.recv_id.as_str())
        .arg(params.group_id.as_str())
        .json_arg(&offline_push_info)
        .arg(params.is_online_only)
}
