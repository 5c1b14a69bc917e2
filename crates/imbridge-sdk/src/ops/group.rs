use imbridge_core::{Invocation, OperationError, OperationId, Response};

use crate::params::{CreateGroup, GroupMemberPage, GroupMembers, JoinGroup, OffsetParams};
use crate::sdk::Sdk;

type OpResult = Result<Response, OperationError>;

impl Sdk {
    pub async fn create_group(
        &self,
        group: &CreateGroup,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("createGroup")
                .operation_id(operation_id)
                .json_arg(group),
        )
        .await
    }

    pub async fn join_group(
        &self,
        join: &JoinGroup,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("joinGroup")
                .operation_id(operation_id)
                .arg(join.group_id.as_str())
                .arg(join.req_msg.as_str())
                .arg(join.join_source)
                .arg(join.ex.as_str()),
        )
        .await
    }

    pub async fn quit_group(&self, group_id: &str, operation_id: Option<OperationId>) -> OpResult {
        self.invoke(
            Invocation::new("quitGroup")
                .operation_id(operation_id)
                .arg(group_id),
        )
        .await
    }

    pub async fn dismiss_group(
        &self,
        group_id: &str,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("dismissGroup")
                .operation_id(operation_id)
                .arg(group_id),
        )
        .await
    }

    pub async fn get_joined_group_list(&self, operation_id: Option<OperationId>) -> OpResult {
        self.invoke(Invocation::new("getJoinedGroupList").operation_id(operation_id))
            .await
    }

    pub async fn get_joined_group_list_page(
        &self,
        page: OffsetParams,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getJoinedGroupListPage")
                .operation_id(operation_id)
                .arg(page.offset)
                .arg(page.count),
        )
        .await
    }

    pub async fn get_specified_groups_info(
        &self,
        group_ids: &[String],
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getSpecifiedGroupsInfo")
                .operation_id(operation_id)
                .json_arg(group_ids),
        )
        .await
    }

    pub async fn get_group_member_list(
        &self,
        page: &GroupMemberPage,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getGroupMemberList")
                .operation_id(operation_id)
                .arg(page.group_id.as_str())
                .arg(page.filter)
                .arg(page.offset)
                .arg(page.count),
        )
        .await
    }

    pub async fn invite_user_to_group(
        &self,
        members: &GroupMembers,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("inviteUserToGroup")
                .operation_id(operation_id)
                .arg(members.group_id.as_str())
                .arg(members.reason.as_str())
                .json_arg(&members.user_ids),
        )
        .await
    }

    pub async fn kick_group_member(
        &self,
        members: &GroupMembers,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("kickGroupMember")
                .operation_id(operation_id)
                .arg(members.group_id.as_str())
                .arg(members.reason.as_str())
                .json_arg(&members.user_ids),
        )
        .await
    }

    pub async fn is_join_group(
        &self,
        group_id: &str,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("isJoinGroup")
                .operation_id(operation_id)
                .arg(group_id),
        )
        .await
    }
}
