use imbridge_core::{Invocation, OperationError, OperationId, Response};

use crate::params::{FriendApplicationResponse, FriendRequest, FriendSearch, FriendsUpdate};
use crate::sdk::Sdk;

type OpResult = Result<Response, OperationError>;

impl Sdk {
    pub async fn get_friend_list(
        &self,
        filter_black: bool,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getFriendList")
                .operation_id(operation_id)
                .arg(filter_black),
        )
        .await
    }

    pub async fn add_friend(
        &self,
        request: &FriendRequest,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("addFriend")
                .operation_id(operation_id)
                .json_arg(request),
        )
        .await
    }

    pub async fn accept_friend_application(
        &self,
        response: &FriendApplicationResponse,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("acceptFriendApplication")
                .operation_id(operation_id)
                .json_arg(response),
        )
        .await
    }

    pub async fn refuse_friend_application(
        &self,
        response: &FriendApplicationResponse,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("refuseFriendApplication")
                .operation_id(operation_id)
                .json_arg(response),
        )
        .await
    }

    pub async fn get_friend_application_list_as_recipient(
        &self,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getFriendApplicationListAsRecipient").operation_id(operation_id),
        )
        .await
    }

    pub async fn search_friends(
        &self,
        search: &FriendSearch,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("searchFriends")
                .operation_id(operation_id)
                .json_arg(search),
        )
        .await
    }

    pub async fn update_friends(
        &self,
        update: &FriendsUpdate,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("updateFriends")
                .operation_id(operation_id)
                .json_arg(update),
        )
        .await
    }

    pub async fn check_friend(
        &self,
        user_ids: &[String],
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("checkFriend")
                .operation_id(operation_id)
                .json_arg(user_ids),
        )
        .await
    }

    pub async fn delete_friend(
        &self,
        user_id: &str,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("deleteFriend")
                .operation_id(operation_id)
                .arg(user_id),
        )
        .await
    }

    pub async fn add_black(
        &self,
        user_id: &str,
        ex: &str,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("addBlack")
                .operation_id(operation_id)
                .arg(user_id)
                .arg(ex),
        )
        .await
    }

    pub async fn remove_black(
        &self,
        user_id: &str,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("removeBlack")
                .operation_id(operation_id)
                .arg(user_id),
        )
        .await
    }

    pub async fn get_black_list(&self, operation_id: Option<OperationId>) -> OpResult {
        self.invoke(Invocation::new("getBlackList").operation_id(operation_id))
            .await
    }
}
